use crate::conflicts::Conflict;
use crate::model::{NatureSegment, Planning, SourceId, TimeSegment, Traducteur};
use crate::repartition::AllocationPlan;
use crate::suggestions::Suggestion;
use crate::window::{format_heure, parse_heure};
use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Import de traducteurs depuis CSV: header `nom,horaire[,capacite][,paires]`
///
/// `paires` liste les paires linguistiques séparées par `;`, ex. `EN>FR;ES>FR`.
pub fn import_traducteurs_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Traducteur>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let nom = rec.get(0).context("missing nom")?.trim();
        let horaire = rec.get(1).context("missing horaire")?.trim();
        if nom.is_empty() || horaire.is_empty() {
            bail!("invalid translator row (empty)");
        }
        let capacite = match rec.get(2).map(str::trim) {
            Some(c) if !c.is_empty() => Some(
                c.replace(',', ".")
                    .parse::<f64>()
                    .with_context(|| format!("invalid capacite for {nom}"))?,
            ),
            _ => None,
        };
        let mut tr = Traducteur::new(nom, horaire, capacite);
        if let Some(raw) = rec.get(3) {
            tr.paires = raw
                .split(';')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        tr.fenetre()
            .with_context(|| format!("invalid horaire for {nom}: {horaire}"))?;
        out.push(tr);
    }
    Ok(out)
}

/// Import de segments:
/// header `traducteur,date,debut,fin,nature,source[,echeance][,priorite][,fractionnable][,paire]`.
///
/// `traducteur` est le nom d'un traducteur déjà présent dans le planning.
/// Une colonne optionnelle vide garde la valeur par défaut.
pub fn import_segments_csv<P: AsRef<Path>>(
    path: P,
    planning: &Planning,
) -> anyhow::Result<Vec<TimeSegment>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for (ligne, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let nom = rec.get(0).context("missing traducteur")?.trim();
        let tr = planning
            .find_traducteur_by_nom(nom)
            .with_context(|| format!("unknown translator: {nom}"))?;
        let date = parse_date(rec.get(1).context("missing date")?.trim())?;
        let debut = parse_heure(rec.get(2).context("missing debut")?.trim())?;
        let fin = parse_heure(rec.get(3).context("missing fin")?.trim())?;
        let nature: NatureSegment = rec
            .get(4)
            .context("missing nature")?
            .parse::<NatureSegment>()
            .map_err(anyhow::Error::msg)?;
        let source = rec.get(5).context("missing source")?.trim();
        if source.is_empty() {
            bail!("empty source on row {}", ligne + 1);
        }

        let mut seg = TimeSegment::new(tr.id.clone(), date, debut, fin, nature, SourceId::new(source))
            .with_context(|| format!("row {}", ligne + 1))?;
        if let Some(raw) = rec.get(6).map(str::trim).filter(|s| !s.is_empty()) {
            seg = seg.avec_echeance(parse_echeance(raw)?);
        }
        if let Some(raw) = rec.get(7).map(str::trim).filter(|s| !s.is_empty()) {
            let priorite = raw
                .parse::<u8>()
                .with_context(|| format!("invalid priorite on row {}: {raw}", ligne + 1))?;
            seg = seg.avec_priorite(priorite);
        }
        if let Some(raw) = rec.get(8).map(str::trim).filter(|s| !s.is_empty()) {
            if !parse_bool(raw).with_context(|| format!("row {}", ligne + 1))? {
                seg = seg.non_fractionnable();
            }
        }
        if let Some(raw) = rec.get(9).map(str::trim).filter(|s| !s.is_empty()) {
            seg = seg.avec_paire(raw);
        }
        out.push(seg);
    }
    Ok(out)
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" | "o" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("invalid boolean: {raw}"),
    }
}

pub fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

/// `2025-12-23T16:00`, avec ou sans secondes ; une date seule vaut la fin de journée.
pub fn parse_echeance(raw: &str) -> anyhow::Result<NaiveDateTime> {
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }
    let date = parse_date(raw).with_context(|| format!("invalid deadline: {raw}"))?;
    date.and_hms_opt(23, 59, 59).context("invalid end-of-day conversion")
}

/// Écrit un plan en CSV: header `date,heures,debut,fin`
pub fn write_plan_csv<W: Write>(writer: W, plan: &AllocationPlan) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record(["date", "heures", "debut", "fin"])?;
    for e in plan {
        w.write_record([
            e.date.format("%Y-%m-%d").to_string(),
            format!("{:.4}", e.heures),
            format_heure(e.debut),
            format_heure(e.fin),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_plan_csv<P: AsRef<Path>>(path: P, plan: &AllocationPlan) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_plan_csv(file, plan)
}

/// Export CSV des conflits:
/// header `type,traducteur,date,segment_a,segment_b,heures,severite,explication`
pub fn export_conflicts_csv<P: AsRef<Path>>(path: P, conflits: &[Conflict]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_path(path)?;
    w.write_record([
        "type",
        "traducteur",
        "date",
        "segment_a",
        "segment_b",
        "heures",
        "severite",
        "explication",
    ])?;
    for c in conflits {
        w.write_record([
            c.type_conflit.as_str().to_string(),
            c.traducteur.to_string(),
            c.date.to_string(),
            c.segment_a.source.to_string(),
            c.segment_b
                .as_ref()
                .map(|s| s.source.to_string())
                .unwrap_or_default(),
            format!("{:.2}", c.chevauchement_heures),
            c.severite.as_str().to_string(),
            c.explication.clone(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export JSON des suggestions (jolie mise en forme)
pub fn export_suggestions_json<P: AsRef<Path>>(path: P, suggestions: &[Suggestion]) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(suggestions)?;
    std::fs::write(path, s)?;
    Ok(())
}
