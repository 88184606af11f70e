//! Sequence diagram model.
//!
//! Activities are keyed by the USR of their caller; each holds the ordered
//! messages produced while walking that caller's body. Participants live in
//! the shared element arena; messages reference them by id.

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::DiagramConfig;
use crate::model::{
    Element, ElementPayload, EntityId, ParticipantData, ParticipantKind, QualifiedName,
};

use super::DiagramModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Call,
    Return,
    ConditionalBegin,
    ConditionalElse,
    ConditionalEnd,
    LoopBegin,
    LoopEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub kind: MessageKind,
    pub from: EntityId,
    pub to: EntityId,
    pub from_usr: String,
    pub to_usr: String,
    /// Callee name for calls; condition text for block markers.
    pub name: String,
    pub return_type: String,
}

/// One caller's execution span and the messages it produces.
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub usr: String,
    pub participant: EntityId,
    pub messages: Vec<Message>,
}

#[derive(Debug, Default)]
pub struct SequenceDiagram {
    pub model: DiagramModel,
    sequences: IndexMap<String, Activity>,
    /// USRs of the activities the config selected as walk roots, in
    /// discovery order; rendering groups messages under these.
    entry_points: Vec<String>,
}

impl SequenceDiagram {
    pub fn new(name: impl Into<String>, using_namespace: QualifiedName) -> Self {
        Self {
            model: DiagramModel::new(name, using_namespace),
            sequences: IndexMap::new(),
            entry_points: Vec::new(),
        }
    }

    pub fn sequences(&self) -> &IndexMap<String, Activity> {
        &self.sequences
    }

    pub fn entry_points(&self) -> &[String] {
        &self.entry_points
    }

    pub fn add_entry_point(&mut self, usr: impl Into<String>) {
        let usr = usr.into();
        if !self.entry_points.contains(&usr) {
            self.entry_points.push(usr);
        }
    }

    pub fn add_activity(&mut self, activity: Activity) {
        self.sequences.entry(activity.usr.clone()).or_insert(activity);
    }

    pub fn activity_mut(&mut self, usr: &str) -> Option<&mut Activity> {
        self.sequences.get_mut(usr)
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty() || self.sequences.values().all(|a| a.messages.is_empty())
    }

    /// Unions a partial diagram produced by one translation-unit worker.
    /// Activities are keyed by caller USR, so a repeated key is the same
    /// walk seen from another translation unit; the first sighting wins.
    pub fn merge_from(&mut self, partial: SequenceDiagram) -> Result<(), crate::error::ModelError> {
        self.model.merge_from(partial.model)?;
        for (_, activity) in partial.sequences {
            self.add_activity(activity);
        }
        for usr in partial.entry_points {
            self.add_entry_point(usr);
        }
        Ok(())
    }

    /// Post-processing per diagram config: folding of repeated activities,
    /// free-function combination, lambda inlining. Entry-point selection
    /// already happened during the walk; activities present here are
    /// reachable from an entry point.
    pub fn finalize(&mut self, config: &DiagramConfig) {
        if config.combine_free_functions_into_file_participants {
            self.combine_free_functions();
        }
        if config.inline_lambda_messages {
            self.inline_lambda_messages();
        }
        if config.fold_repeated_activities {
            self.fold_repeated_activities();
        }
    }

    /// Collapses consecutive identical call messages inside every activity;
    /// the paired return of a folded call disappears with it.
    fn fold_repeated_activities(&mut self) {
        for activity in self.sequences.values_mut() {
            let mut folded: Vec<Message> = Vec::with_capacity(activity.messages.len());
            for message in activity.messages.drain(..) {
                let repeated = match (message.kind, folded.len()) {
                    (MessageKind::Call, n) if n >= 2 => {
                        folded[n - 2].kind == MessageKind::Call
                            && folded[n - 2].to == message.to
                            && folded[n - 2].name == message.name
                            && folded[n - 1].kind == MessageKind::Return
                            && folded[n - 1].from == message.to
                    }
                    (MessageKind::Call, 1) => {
                        folded[0].kind == MessageKind::Call
                            && folded[0].to == message.to
                            && folded[0].name == message.name
                    }
                    _ => false,
                };
                let repeated_return = message.kind == MessageKind::Return
                    && folded
                        .last()
                        .is_some_and(|prev| prev.kind == MessageKind::Return && prev.from == message.from);
                if !repeated && !repeated_return {
                    folded.push(message);
                }
            }
            activity.messages = folded;
        }
    }

    /// Replaces every free-function participant with one participant per
    /// source file. Method participants are untouched.
    fn combine_free_functions(&mut self) {
        let mut remap: Vec<(EntityId, EntityId)> = Vec::new();
        let mut file_participants: Vec<Element> = Vec::new();

        for element in self.model.elements() {
            let ElementPayload::Participant(data) = &element.payload else {
                continue;
            };
            if data.kind != ParticipantKind::Function {
                continue;
            }
            let Some(location) = &element.source_location else {
                continue;
            };
            let label = file_label(&location.file);
            let participant = Element::new(
                QualifiedName::new(),
                label,
                ElementPayload::Participant(ParticipantData {
                    kind: ParticipantKind::File,
                    usr: format!("file:{}", location.file.display()),
                }),
            );
            remap.push((element.id, participant.id));
            file_participants.push(participant);
        }

        for participant in file_participants {
            // Same file yields the same id; merge is idempotent.
            let _ = self.model.add_element(participant);
        }
        for (old, new) in &remap {
            if let Some(element) = self.model.get_mut(*old) {
                element.skip = true;
            }
            for activity in self.sequences.values_mut() {
                if activity.participant == *old {
                    activity.participant = *new;
                }
                for message in &mut activity.messages {
                    if message.from == *old {
                        message.from = *new;
                    }
                    if message.to == *old {
                        message.to = *new;
                    }
                }
            }
        }
        // Self-messages created by folding two functions of one file into a
        // single participant stay; they are real calls.
    }

    /// Splices lambda activities into their creating activity and hides the
    /// lambda participants.
    fn inline_lambda_messages(&mut self) {
        let lambda_ids: Vec<(EntityId, String)> = self
            .model
            .elements()
            .filter_map(|element| match &element.payload {
                ElementPayload::Participant(data) if data.kind == ParticipantKind::Lambda => {
                    Some((element.id, data.usr.clone()))
                }
                _ => None,
            })
            .collect();
        if lambda_ids.is_empty() {
            return;
        }

        let usrs: Vec<String> = self.sequences.keys().cloned().collect();
        for usr in usrs {
            // Mutually-recursive lambdas would splice forever; cap the pass.
            let mut fuel = 64usize;
            loop {
                if fuel == 0 {
                    break;
                }
                fuel -= 1;
                let Some(activity) = self.sequences.get(&usr) else {
                    break;
                };
                let Some(position) = activity.messages.iter().position(|message| {
                    message.kind == MessageKind::Call
                        && lambda_ids.iter().any(|(id, _)| *id == message.to)
                }) else {
                    break;
                };
                let call = activity.messages[position].clone();
                let inner: Vec<Message> = self
                    .sequences
                    .get(&call.to_usr)
                    .map(|lambda| {
                        lambda
                            .messages
                            .iter()
                            .cloned()
                            .map(|mut message| {
                                if message.from == call.to {
                                    message.from = call.from;
                                    message.from_usr = call.from_usr.clone();
                                }
                                if message.to == call.to {
                                    message.to = call.from;
                                }
                                message
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                let activity = self.sequences.get_mut(&usr).expect("activity exists");
                // Drop the call and, when present, its paired return.
                let mut end = position + 1;
                if activity
                    .messages
                    .get(end)
                    .is_some_and(|m| m.kind == MessageKind::Return && m.from == call.to)
                {
                    end += 1;
                }
                let _ = activity.messages.splice(position..end, inner);
            }
        }
        for (id, usr) in &lambda_ids {
            if let Some(element) = self.model.get_mut(*id) {
                element.skip = true;
            }
            self.sequences.shift_remove(usr);
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
