use std::io::Write;
use std::path::Path;

use clap::ValueEnum;
use quill_core::{FightEvents, ResolvedScribingDetection, ScribingDetectionsMap};

use crate::{CliContext, error_chain};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn load_events(path: &Path) -> Result<FightEvents, String> {
    FightEvents::load(path).map_err(|e| error_chain(&e))
}

pub fn detect(
    ctx: &CliContext,
    events_path: &Path,
    player_id: i64,
    ability_id: i64,
    format: OutputFormat,
) -> Result<(), String> {
    let events = load_events(events_path)?;
    let result = ctx
        .engine
        .try_detect(ability_id, player_id, &events)
        .map_err(|e| error_chain(&e))?;

    let Some(detection) = result else {
        println!("Ability {ability_id} is not a scribing ability");
        return Ok(());
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&detection).map_err(|e| e.to_string())?;
            println!("{json}");
        }
        OutputFormat::Table => print!("{}", format_detection(player_id, &detection)),
    }
    Ok(())
}

pub fn batch(
    ctx: &CliContext,
    events_path: &Path,
    fight_id: Option<i64>,
    players: &[i64],
    parallel: bool,
    format: OutputFormat,
) -> Result<(), String> {
    let events = load_events(events_path)?;
    let fight_id = fight_id.unwrap_or(events.fight_id());

    let mut roster = ctx.engine.scribing_roster(&events);
    if !players.is_empty() {
        roster.retain(|entry| players.contains(&entry.player_id));
    }

    let detections = if parallel || ctx.config.parallel {
        let on_progress = |p: f64| tracing::debug!(progress = p, "Batch progress");
        ctx.engine
            .par_detect_all(fight_id, &events, &roster, Some(&on_progress))
    } else {
        let mut on_progress = |p: f64| tracing::debug!(progress = p, "Batch progress");
        ctx.engine
            .detect_all(fight_id, &events, &roster, Some(&mut on_progress))
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&detections).map_err(|e| e.to_string())?;
            println!("{json}");
        }
        OutputFormat::Table => print!("{}", format_batch(&detections)),
    }
    Ok(())
}

pub fn lookup(ctx: &CliContext, ability_id: i64) -> Result<(), String> {
    let catalog = ctx.catalog();
    let mut found = false;

    if let Some(skill) = catalog.lookup_skill(ability_id) {
        found = true;
        println!(
            "{ability_id}: {} / {} ({})",
            skill.grimoire_name, skill.transformation, skill.transformation_type
        );
    }
    if let Some(name) = catalog.signature_name(ability_id) {
        found = true;
        println!("{ability_id}: signature script effect of {name}");
    }
    if let Some(name) = catalog.affix_name(ability_id) {
        found = true;
        println!("{ability_id}: affix script effect of {name}");
    }
    if !found {
        println!("{ability_id}: not in the scribing catalog");
    }
    Ok(())
}

pub fn show_catalog(ctx: &CliContext) -> Result<(), String> {
    let catalog = ctx.catalog();
    let stats = catalog.stats();

    println!("Catalog version {}", catalog.version());
    println!("{:<28} {:>10} Foci", "Grimoire", "Base ID");
    println!("{}", "-".repeat(50));
    for grimoire in catalog.grimoires() {
        println!(
            "{:<28} {:>10} {}",
            grimoire.name,
            grimoire.id,
            grimoire.foci.len()
        );
    }
    println!(
        "\n{} grimoires, {} foci, {} skill ids",
        stats.grimoires, stats.foci, stats.skill_ids
    );
    println!(
        "{} signature scripts ({} ids), {} affix scripts ({} ids)",
        stats.signature_scripts, stats.signature_ids, stats.affix_scripts, stats.affix_ids
    );
    Ok(())
}

pub fn exit() {
    let mut stdout = std::io::stdout();
    // Nothing useful to do if stdout is gone while quitting
    let _ = writeln!(stdout, "quitting...");
    let _ = stdout.flush();
}

// ─────────────────────────────────────────────────────────────────────────────
// Table Output
// ─────────────────────────────────────────────────────────────────────────────

fn percent(confidence: f64) -> u32 {
    (confidence * 100.0).round() as u32
}

pub fn format_detection(player_id: i64, detection: &ResolvedScribingDetection) -> String {
    let mut out = String::new();

    let effective = if detection.effective_ability_id != detection.ability_id {
        format!(" (resolved to {})", detection.effective_ability_id)
    } else {
        String::new()
    };
    out.push_str(&format!(
        "Player {player_id}  Ability {}{effective}\n",
        detection.ability_id
    ));
    out.push_str(&format!("  {:<11} {}\n", "Recipe:", detection.recipe.summary));
    out.push_str(&format!(
        "  {:<11} {} logged, {} synthetic\n",
        "Casts:", detection.cast_count, detection.synthetic_cast_count
    ));
    out.push_str(&format!(
        "  {:<11} {} ({}%) [{:?}]\n",
        "Signature:",
        detection.signature.name,
        percent(detection.signature.confidence),
        detection.signature.status
    ));
    match detection.primary_affix() {
        Some(affix) => out.push_str(&format!(
            "  {:<11} {} ({}%) [{:?}]\n",
            "Affix:",
            affix.name,
            percent(affix.confidence),
            affix.status
        )),
        None => out.push_str(&format!("  {:<11} -\n", "Affix:")),
    }
    out
}

pub fn format_batch(detections: &ScribingDetectionsMap) -> String {
    if detections.is_empty() {
        return format!("Fight {}: no scribing abilities detected\n", detections.fight_id);
    }

    let mut out = format!("Fight {}\n", detections.fight_id);
    for (player_id, abilities) in &detections.players {
        for detection in abilities.values() {
            out.push_str(&format_detection(*player_id, detection));
        }
    }
    out.push_str(&format!("\nTotal: {} detections\n", detections.len()));
    out
}
