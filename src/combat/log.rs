//! Combat logging
//!
//! Records all combat events for post-match analysis: a chronological entry
//! stream plus structured per-combatant tallies, exportable as JSON.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier for combatants in the log, e.g. "Team 1 Slinger".
pub type CombatantId = String;

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Timestamp in match time (seconds since match start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Skill cast executed
    SkillUsed,
    /// Effect applied
    EffectApplied,
    /// Effect removed
    EffectRemoved,
    /// Combatant died
    Death,
    /// Match event (start, end, etc.)
    MatchEvent,
}

/// The combat log resource storing all events and per-combatant tallies.
#[derive(Resource, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current match time
    pub match_time: f32,
    /// Registered combatants, in spawn order
    pub combatants: Vec<CombatantId>,
    damage_totals: HashMap<CombatantId, f32>,
    damage_by_skill: HashMap<(CombatantId, String), f32>,
    healing_totals: HashMap<CombatantId, f32>,
    overheal_totals: HashMap<CombatantId, f32>,
}

impl CombatLog {
    /// Clear the log for a new match
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
        self.combatants.clear();
        self.damage_totals.clear();
        self.damage_by_skill.clear();
        self.healing_totals.clear();
        self.overheal_totals.clear();
    }

    pub fn register_combatant(&mut self, id: CombatantId) {
        self.combatants.push(id);
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
        });
    }

    /// Record applied damage against the structured tallies and the entry
    /// stream. Zero-applied hits (evades, blocks, immunity) still get an
    /// entry but do not move the tallies.
    pub fn record_damage(&mut self, source: &str, target: &str, skill: &str, applied: f32) {
        if applied > 0.0 {
            *self.damage_totals.entry(source.to_string()).or_default() += applied;
            *self
                .damage_by_skill
                .entry((source.to_string(), skill.to_string()))
                .or_default() += applied;
        }
        self.log(
            CombatLogEventType::Damage,
            format!("{}'s {} hits {} for {:.0} warmth", source, skill, target, applied),
        );
    }

    pub fn record_healing(
        &mut self,
        source: &str,
        target: &str,
        skill: &str,
        applied: f32,
        overheal: f32,
    ) {
        *self.healing_totals.entry(source.to_string()).or_default() += applied;
        *self.overheal_totals.entry(source.to_string()).or_default() += overheal;
        let suffix = if overheal > 0.0 {
            format!(" ({:.0} overheal)", overheal)
        } else {
            String::new()
        };
        self.log(
            CombatLogEventType::Healing,
            format!("{}'s {} warms {} for {:.0}{}", source, skill, target, applied, suffix),
        );
    }

    pub fn total_damage_dealt(&self, id: &str) -> f32 {
        self.damage_totals.get(id).copied().unwrap_or(0.0)
    }

    pub fn damage_by_skill(&self, id: &str, skill: &str) -> f32 {
        self.damage_by_skill
            .get(&(id.to_string(), skill.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn total_healing_done(&self, id: &str) -> f32 {
        self.healing_totals.get(id).copied().unwrap_or(0.0)
    }

    pub fn total_overheal(&self, id: &str) -> f32 {
        self.overheal_totals.get(id).copied().unwrap_or(0.0)
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only warmth-changing events (damage and healing)
    pub fn warmth_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Serialize the log plus match metadata to a JSON file.
    ///
    /// Returns the path written. Default path is `match_log.json` in the
    /// working directory.
    pub fn save_to_file(
        &self,
        metadata: &MatchMetadata,
        output_path: Option<&str>,
    ) -> Result<String, String> {
        let export = MatchLogExport {
            metadata,
            match_time: self.match_time,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&export)
            .map_err(|e| format!("Failed to serialize match log: {}", e))?;

        let path = output_path.unwrap_or("match_log.json").to_string();
        std::fs::write(&path, json).map_err(|e| format!("Failed to write {}: {}", path, e))?;
        Ok(path)
    }
}

/// End-of-match metadata attached to the exported log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// Winning team (1 or 2), None for a draw/timeout
    pub winner: Option<u8>,
    /// Match duration in seconds
    pub duration: f32,
    /// Seed used, if the match was deterministic
    pub seed: Option<u64>,
    pub team1: Vec<CombatantMetadata>,
    pub team2: Vec<CombatantMetadata>,
}

/// Per-combatant summary in the exported log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantMetadata {
    pub class_name: String,
    pub max_warmth: f32,
    pub final_warmth: f32,
    pub max_energy: f32,
    pub final_energy: f32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub healing_done: f32,
    pub overheal_done: f32,
    pub survived: bool,
}

#[derive(Serialize)]
struct MatchLogExport<'a> {
    metadata: &'a MatchMetadata,
    match_time: f32,
    entries: &'a [CombatLogEntry],
}
