//! Sequence diagram traversal.
//!
//! Two passes over the translation unit. The first indexes every function
//! and method body by USR, in declaration order. The second walks the bodies
//! of the configured entry points, producing messages in visit order; a call
//! whose callee is indexed recurses into that callee's body, guarded by the
//! set of activities currently on the stack so recursion targets are
//! referenced but never re-walked.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::config::{DiagramConfig, EntryPoint};
use crate::diagram::sequence::{Activity, Message, MessageKind};
use crate::diagram::SequenceDiagram;
use crate::error::ModelError;
use crate::filter::{DiagramFilter, Filtered};
use crate::frontend::{BlockKind, CallExpr, Declaration, LambdaExpr, Stmt, TranslationUnit};
use crate::model::{
    Element, ElementPayload, EntityId, ParticipantData, ParticipantKind, QualifiedName,
    SourceLocation,
};

/// One callable indexed from the translation unit.
struct FnInfo<'t> {
    usr: &'t str,
    /// `ns::A::aa` without parentheses; entry points match against this.
    qualified_name: String,
    /// Message label (`aa()`).
    call_name: String,
    /// Participant the activity runs on: the class for methods, the
    /// function itself for free functions.
    participant_namespace: QualifiedName,
    participant_name: String,
    participant_kind: ParticipantKind,
    return_type: String,
    location: Option<&'t SourceLocation>,
    body: &'t [Stmt],
}

pub struct SequenceDiagramVisitor<'a> {
    diagram: &'a mut SequenceDiagram,
    filter: &'a DiagramFilter,
    config: &'a DiagramConfig,
}

impl<'a> SequenceDiagramVisitor<'a> {
    pub fn new(
        diagram: &'a mut SequenceDiagram,
        filter: &'a DiagramFilter,
        config: &'a DiagramConfig,
    ) -> Self {
        Self {
            diagram,
            filter,
            config,
        }
    }

    pub fn visit_translation_unit(&mut self, tu: &TranslationUnit) -> Result<(), ModelError> {
        let mut index: IndexMap<&str, FnInfo<'_>> = IndexMap::new();
        collect_callables(&tu.declarations, &QualifiedName::new(), &mut index);

        // Roots are taken in config order; non-matching entries (and roots
        // declared in other translation units) are simply skipped here.
        let mut roots: Vec<&str> = Vec::new();
        for entry in &self.config.start_from {
            for info in index.values() {
                if matches_entry_point(entry, info) && !roots.contains(&info.usr) {
                    roots.push(info.usr);
                }
            }
        }

        let mut active: HashSet<String> = HashSet::new();
        for root in roots {
            self.walk_activity(root, &index, &mut active)?;
            if self.diagram.sequences().contains_key(root) {
                self.diagram.add_entry_point(root);
            }
        }
        Ok(())
    }

    fn walk_activity(
        &mut self,
        usr: &str,
        index: &IndexMap<&str, FnInfo<'_>>,
        active: &mut HashSet<String>,
    ) -> Result<(), ModelError> {
        if self.diagram.sequences().contains_key(usr) {
            return Ok(());
        }
        let Some(info) = index.get(usr) else {
            return Ok(());
        };
        let Some(participant) = self.ensure_participant(
            &info.participant_namespace,
            &info.participant_name,
            info.participant_kind,
            usr,
            info.location,
        )?
        else {
            return Ok(());
        };

        active.insert(usr.to_string());
        let mut messages = Vec::new();
        self.walk_statements(info, participant, info.body, index, active, &mut messages)?;
        active.remove(usr);

        self.diagram.add_activity(Activity {
            usr: usr.to_string(),
            participant,
            messages,
        });
        Ok(())
    }

    fn walk_statements(
        &mut self,
        caller: &FnInfo<'_>,
        caller_participant: EntityId,
        statements: &[Stmt],
        index: &IndexMap<&str, FnInfo<'_>>,
        active: &mut HashSet<String>,
        messages: &mut Vec<Message>,
    ) -> Result<(), ModelError> {
        let mut position = 0usize;
        while position < statements.len() {
            match &statements[position] {
                Stmt::Call(call) => {
                    self.walk_call(caller, caller_participant, call, index, active, messages)?;
                    position += 1;
                }
                Stmt::Lambda(lambda) => {
                    self.walk_lambda(caller, caller_participant, lambda, index, active, messages)?;
                    position += 1;
                }
                Stmt::Block(block) if block.kind == BlockKind::Loop => {
                    let emit = self.config.generate_condition_statements;
                    if emit {
                        messages.push(self.marker(
                            caller,
                            caller_participant,
                            MessageKind::LoopBegin,
                            block.condition.clone(),
                        ));
                    }
                    self.walk_statements(
                        caller,
                        caller_participant,
                        &block.body,
                        index,
                        active,
                        messages,
                    )?;
                    if emit {
                        messages.push(self.marker(
                            caller,
                            caller_participant,
                            MessageKind::LoopEnd,
                            None,
                        ));
                    }
                    position += 1;
                }
                Stmt::Block(block) => {
                    // A conditional owns every alternative that directly
                    // follows it; one end marker closes the chain.
                    let emit = self.config.generate_condition_statements;
                    if emit {
                        messages.push(self.marker(
                            caller,
                            caller_participant,
                            MessageKind::ConditionalBegin,
                            block.condition.clone(),
                        ));
                    }
                    self.walk_statements(
                        caller,
                        caller_participant,
                        &block.body,
                        index,
                        active,
                        messages,
                    )?;
                    position += 1;
                    while let Some(Stmt::Block(alternative)) = statements.get(position) {
                        if alternative.kind != BlockKind::Alternative {
                            break;
                        }
                        if emit {
                            messages.push(self.marker(
                                caller,
                                caller_participant,
                                MessageKind::ConditionalElse,
                                alternative.condition.clone(),
                            ));
                        }
                        self.walk_statements(
                            caller,
                            caller_participant,
                            &alternative.body,
                            index,
                            active,
                            messages,
                        )?;
                        position += 1;
                    }
                    if emit {
                        messages.push(self.marker(
                            caller,
                            caller_participant,
                            MessageKind::ConditionalEnd,
                            None,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn walk_call(
        &mut self,
        caller: &FnInfo<'_>,
        caller_participant: EntityId,
        call: &CallExpr,
        index: &IndexMap<&str, FnInfo<'_>>,
        active: &mut HashSet<String>,
        messages: &mut Vec<Message>,
    ) -> Result<(), ModelError> {
        let callee = call
            .callee_usr
            .as_deref()
            .and_then(|usr| index.get(usr));

        let (callee_participant, callee_usr, call_name, return_type) = match callee {
            Some(info) => {
                let participant = self.ensure_participant(
                    &info.participant_namespace,
                    &info.participant_name,
                    info.participant_kind,
                    info.usr,
                    info.location,
                )?;
                (
                    participant,
                    info.usr.to_string(),
                    info.call_name.clone(),
                    info.return_type.clone(),
                )
            }
            None => {
                // Callee declared elsewhere: a terminal message to a
                // participant synthesized from the spelled name.
                let name = QualifiedName::parse(&call.callee_name);
                let participant = self.ensure_participant(
                    &name.parent(),
                    &format!("{}()", name.name()),
                    ParticipantKind::Function,
                    call.callee_usr.as_deref().unwrap_or(&call.callee_name),
                    call.location.as_ref(),
                )?;
                (
                    participant,
                    call.callee_usr.clone().unwrap_or_default(),
                    format!("{}()", name.name()),
                    call.return_type.clone().unwrap_or_else(|| "void".into()),
                )
            }
        };
        let Some(callee_participant) = callee_participant else {
            // Filtered endpoint: no message, no descent.
            return Ok(());
        };

        messages.push(Message {
            kind: MessageKind::Call,
            from: caller_participant,
            to: callee_participant,
            from_usr: caller.usr.to_string(),
            to_usr: callee_usr.clone(),
            name: call_name,
            return_type: return_type.clone(),
        });

        if let Some(info) = callee {
            if !active.contains(info.usr) {
                self.walk_activity(info.usr, index, active)?;
            }
        }

        if return_type != "void" && !return_type.is_empty() {
            messages.push(Message {
                kind: MessageKind::Return,
                from: callee_participant,
                to: caller_participant,
                from_usr: callee_usr,
                to_usr: caller.usr.to_string(),
                name: String::new(),
                return_type,
            });
        }
        Ok(())
    }

    fn walk_lambda(
        &mut self,
        caller: &FnInfo<'_>,
        caller_participant: EntityId,
        lambda: &LambdaExpr,
        index: &IndexMap<&str, FnInfo<'_>>,
        active: &mut HashSet<String>,
        messages: &mut Vec<Message>,
    ) -> Result<(), ModelError> {
        let Some(participant) = self.ensure_participant(
            &QualifiedName::new(),
            &lambda.name,
            ParticipantKind::Lambda,
            &lambda.usr,
            None,
        )?
        else {
            return Ok(());
        };
        messages.push(Message {
            kind: MessageKind::Call,
            from: caller_participant,
            to: participant,
            from_usr: caller.usr.to_string(),
            to_usr: lambda.usr.clone(),
            name: "operator()()".to_string(),
            return_type: "void".to_string(),
        });

        if !active.contains(&lambda.usr) && !self.diagram.sequences().contains_key(&lambda.usr) {
            active.insert(lambda.usr.clone());
            let lambda_info = FnInfo {
                usr: &lambda.usr,
                qualified_name: lambda.name.clone(),
                call_name: "operator()()".to_string(),
                participant_namespace: QualifiedName::new(),
                participant_name: lambda.name.clone(),
                participant_kind: ParticipantKind::Lambda,
                return_type: "void".to_string(),
                location: None,
                body: &lambda.body,
            };
            let mut inner = Vec::new();
            self.walk_statements(&lambda_info, participant, &lambda.body, index, active, &mut inner)?;
            active.remove(&lambda.usr);
            self.diagram.add_activity(Activity {
                usr: lambda.usr.clone(),
                participant,
                messages: inner,
            });
        }
        Ok(())
    }

    fn marker(
        &self,
        caller: &FnInfo<'_>,
        participant: EntityId,
        kind: MessageKind,
        condition: Option<String>,
    ) -> Message {
        Message {
            kind,
            from: participant,
            to: participant,
            from_usr: caller.usr.to_string(),
            to_usr: caller.usr.to_string(),
            name: condition.unwrap_or_default(),
            return_type: String::new(),
        }
    }

    /// Builds (or re-finds) the participant element, running it through the
    /// filter. `None` means the participant is excluded and with it every
    /// message touching it.
    fn ensure_participant(
        &mut self,
        namespace: &QualifiedName,
        name: &str,
        kind: ParticipantKind,
        usr: &str,
        location: Option<&SourceLocation>,
    ) -> Result<Option<EntityId>, ModelError> {
        let mut element = Element::new(
            namespace.clone(),
            name,
            ElementPayload::Participant(ParticipantData {
                kind,
                usr: usr.to_string(),
            }),
        );
        element.source_location = location.cloned();
        match self.filter.should_include_element(&element, &self.diagram.model) {
            Filtered::Include => Ok(Some(self.diagram.model.add_element(element)?)),
            // Sequence walks are linear; an undecidable participant is
            // treated as excluded rather than deferred.
            Filtered::Defer | Filtered::Exclude => Ok(None),
        }
    }
}

fn matches_entry_point(entry: &EntryPoint, info: &FnInfo<'_>) -> bool {
    match entry {
        EntryPoint::Function { function } => {
            function == &info.qualified_name || *function == format!("{}()", info.qualified_name)
        }
        EntryPoint::Usr { usr } => usr == info.usr,
        EntryPoint::Location { file, line } => info
            .location
            .is_some_and(|loc| &loc.file == file && loc.line == *line),
    }
}

/// Indexes every callable with a body, in declaration order.
fn collect_callables<'t>(
    declarations: &'t [Declaration],
    namespace: &QualifiedName,
    index: &mut IndexMap<&'t str, FnInfo<'t>>,
) {
    for declaration in declarations {
        match declaration {
            Declaration::Namespace(ns) => {
                let mut inner = namespace.clone();
                if !ns.is_anonymous && !ns.is_inline {
                    inner.push(ns.name.as_str());
                }
                collect_callables(&ns.declarations, &inner, index);
            }
            Declaration::Function(function) => {
                index.insert(
                    function.usr.as_str(),
                    FnInfo {
                        usr: &function.usr,
                        qualified_name: namespace.appending(function.name.as_str()).to_string(),
                        call_name: format!("{}()", function.name),
                        participant_namespace: namespace.clone(),
                        participant_name: format!("{}()", function.name),
                        participant_kind: ParticipantKind::Function,
                        return_type: function.return_type.canonical_name(),
                        location: function.location.as_ref(),
                        body: &function.body,
                    },
                );
            }
            Declaration::Record(record) => {
                let record_path = namespace.appending(record.name.as_str());
                for method in &record.methods {
                    index.insert(
                        method.usr.as_str(),
                        FnInfo {
                            usr: &method.usr,
                            qualified_name: record_path.appending(method.name.as_str()).to_string(),
                            call_name: format!("{}()", method.name),
                            participant_namespace: namespace.clone(),
                            participant_name: record.name.clone(),
                            participant_kind: ParticipantKind::Method,
                            return_type: method.return_type.canonical_name(),
                            location: method.location.as_ref(),
                            body: &method.body,
                        },
                    );
                }
                collect_callables(&record.nested, &record_path, index);
            }
            Declaration::Enum(_) | Declaration::Concept(_) | Declaration::Alias(_) => {}
        }
    }
}
