use std::sync::Arc;
use tracing::{debug, error, info, info_span};

use super::action::{Action, ActionFactory, GoalAction};
use super::context::{Context, PendingConfirmation};
use super::goal::Goal;
use super::telemetry::event::{DecisionBranch, OutcomeKind, TelemetryEvent};
use super::telemetry::recorder::TelemetryRecorder;
use crate::catalog::{Catalogs, IntentCategory, IntentSpec};
use crate::config::{PolicyConfig, Thresholds};
use crate::error::{DialogError, Result};
use crate::nlu::{ConfidenceScorer, DetectedEntity, EntityCorrector, TurnPayload};

/// Goal-based dialog manager.
///
/// Given the intent and entities of a user message, decides what the agent
/// does next, reading and advancing the conversation's `Context`.
/// Decisions are deterministic: same payload + same context = same actions.
pub struct DialogManager {
    catalogs: Arc<Catalogs>,
    config: PolicyConfig,
    corrector: EntityCorrector,
    scorer: ConfidenceScorer,
    factory: ActionFactory,
    pub telemetry: TelemetryRecorder,
}

/// Outcome of the decision tree, before anti-repetition.
struct Decision {
    branch: DecisionBranch,
    actions: Vec<Action>,
    reset: bool,
}

impl Decision {
    fn new(branch: DecisionBranch, actions: Vec<Action>) -> Self {
        Self {
            branch,
            actions,
            reset: false,
        }
    }
}

impl DialogManager {
    pub fn new(catalogs: Arc<Catalogs>, config: PolicyConfig) -> Self {
        Self {
            corrector: EntityCorrector::new(Arc::clone(&catalogs), config.correction.clone()),
            scorer: ConfidenceScorer::new(Arc::clone(&catalogs), config.classifier_weight, config.entity_weight),
            factory: ActionFactory::new(),
            telemetry: TelemetryRecorder::new(),
            catalogs,
            config,
        }
    }

    pub fn catalogs(&self) -> &Arc<Catalogs> {
        &self.catalogs
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Registers the domain hook of a goal action.
    pub fn register_action(&mut self, name: impl Into<String>, handler: Box<dyn GoalAction>) {
        self.factory.register(name, handler);
    }

    /// Fresh conversation, in its initial state.
    pub fn new_context(&self) -> Context {
        Context::new(Arc::clone(&self.catalogs), &self.config)
    }

    /// Handles one user message and returns the (non-empty) list of actions
    /// to take.
    ///
    /// The turn runs on a copy of `context`; the copy replaces it only when the
    /// turn succeeds. On error `context` is left exactly as it was.
    pub fn handle_turn(&mut self, payload: &TurnPayload, context: &mut Context) -> Result<Vec<Action>> {
        let span = info_span!("turn", conversation = ?context.id(), intent = %payload.intent.name);
        let _enter = span.enter();

        let mut working = context.clone();
        let decision = match self.decide(payload, &mut working) {
            Ok(decision) => decision,
            Err(e) => {
                error!("Turn aborted: {}", e);
                self.telemetry.record(TelemetryEvent::TurnAborted {
                    conversation: context.id(),
                });
                return Err(e);
            }
        };

        let (actions, rewritten) = self.filter_repeated_requests(decision.actions, &mut working);
        working.update_from(&actions);

        let conversation = working.id();
        if decision.reset {
            self.telemetry.record(TelemetryEvent::ConversationReset { conversation });
        }
        if working.goal_switches() != context.goal_switches() {
            self.telemetry.record(TelemetryEvent::GoalSwitched {
                conversation,
                from: context.current_goal().name.clone(),
                to: working.current_goal().name.clone(),
            });
        }
        if let Some(last) = actions.last() {
            self.telemetry.record(TelemetryEvent::TurnDecided {
                conversation,
                branch: decision.branch,
                outcome: OutcomeKind::from(last),
                rewritten,
            });
        }

        debug!("Decided: {:?} ({:?})", actions, decision.branch);
        *context = working;
        Ok(actions)
    }

    fn decide(&self, payload: &TurnPayload, context: &mut Context) -> Result<Decision> {
        // 1. Explicit reset, whatever the classifier says
        if payload.text == self.config.reset_sentinel {
            context.reset();
            let mut decision = Decision::new(DecisionBranch::Reset, self.pursue_goal(context)?);
            decision.reset = true;
            return Ok(decision);
        }

        let catalogs = Arc::clone(&self.catalogs);
        let intent = catalogs.intent(&payload.intent.name)?;

        // 2. Correct entities, 3. blend confidences
        let entities = self.corrector.correct(&payload.entities)?;
        let confidence = self.scorer.score(&intent.name, payload, &entities)?;
        let expected = context.is_expecting(&intent.name)?;
        debug!(
            "Intent '{}' ({:?}): confidence {} -> {}, expected: {}",
            intent.name, intent.category, payload.intent.confidence, confidence, expected
        );

        // 4. Branch
        if expected {
            let thresholds = self.config.expected;
            if confidence > thresholds.soft {
                let (actions, reset) = self.act_on_understood(intent, &entities, context, thresholds)?;
                Ok(Decision {
                    branch: DecisionBranch::ExpectedConfident,
                    actions,
                    reset,
                })
            } else if confidence > thresholds.hard {
                if intent.category == IntentCategory::Triggering {
                    let actions = self.request_goal_confirmation(intent, context)?;
                    return Ok(Decision::new(DecisionBranch::ExpectedDoubtful, actions));
                }
                // Only goal switches are worth a confirmation here
                let (actions, reset) = self.act_on_understood(intent, &entities, context, thresholds)?;
                Ok(Decision {
                    branch: DecisionBranch::ExpectedDoubtful,
                    actions,
                    reset,
                })
            } else {
                Ok(Decision::new(DecisionBranch::ExpectedNotUnderstood, vec![Action::AskRephrase]))
            }
        } else {
            let thresholds = self.config.unexpected;
            if confidence <= thresholds.soft {
                return Ok(Decision::new(DecisionBranch::UnexpectedNotUnderstood, vec![Action::AskRephrase]));
            }

            let actions = if intent.category == IntentCategory::Triggering {
                self.request_goal_confirmation(intent, context)?
            } else if let Some(pending) = context.pending_goal() {
                vec![Action::ConfirmIntent {
                    intent: pending.triggering_intent.clone(),
                }]
            } else if intent.category == IntentCategory::Informing {
                match self.fill_slots(&entities, context, thresholds)? {
                    Some(confirmation) => vec![confirmation],
                    None => self.pursue_goal(context)?,
                }
            } else {
                vec![Action::AskRephrase]
            };
            Ok(Decision::new(DecisionBranch::UnexpectedConfident, actions))
        }
    }

    /// Acts on an intent taken as understood: dispatch on its category, then
    /// fill slots, then pursue the goal. The flag tells whether the
    /// conversation was reset on the way.
    fn act_on_understood(
        &self,
        intent: &IntentSpec,
        entities: &[DetectedEntity],
        context: &mut Context,
        thresholds: Thresholds,
    ) -> Result<(Vec<Action>, bool)> {
        let mut reset = false;
        match intent.category {
            IntentCategory::Triggering => {
                let goal = self.triggered_goal(intent)?;
                context.set_goal(goal);
            }
            IntentCategory::Informing => {
                // Carrying on with the current goal answers the pending goal question
                if let Some(ignored) = context.pending_goal() {
                    debug!("Goal '{}' was not confirmed, dropping it", ignored.name);
                    context.discard_potential_new_goal();
                }
            }
            IntentCategory::ConfirmationAnswer => {
                reset = self.resolve_confirmation(intent, context)?;
            }
            IntentCategory::Other(_) => {
                // Unreachable with sane expected-reply filters
                return Ok((vec![Action::AskRephrase], false));
            }
        }

        if let Some(confirmation) = self.fill_slots(entities, context, thresholds)? {
            return Ok((vec![confirmation], reset));
        }
        Ok((self.pursue_goal(context)?, reset))
    }

    fn triggered_goal(&self, intent: &IntentSpec) -> Result<Goal> {
        // Every triggering intent has a goal (checked at load time)
        self.catalogs
            .goal_triggered_by(&intent.name)
            .map(Goal::from_spec)
            .ok_or_else(|| DialogError::Configuration(format!("intent '{}' triggers no goal", intent.name)))
    }

    fn request_goal_confirmation(&self, intent: &IntentSpec, context: &mut Context) -> Result<Vec<Action>> {
        let goal = self.triggered_goal(intent)?;
        context.set_potential_new_goal(goal);
        Ok(vec![Action::ConfirmIntent {
            intent: intent.name.clone(),
        }])
    }

    /// Settles whatever awaits a yes/no, goal confirmations first.
    /// Returns `true` if the denial sent the conversation back to its initial state.
    fn resolve_confirmation(&self, answer: &IntentSpec, context: &mut Context) -> Result<bool> {
        let affirmative = answer.is_affirmative();
        match context.pending() {
            Some(PendingConfirmation::NewGoal(_)) => {
                if affirmative {
                    context.confirm_new_goal();
                    return Ok(false);
                }
                context.discard_potential_new_goal();
            }
            Some(PendingConfirmation::Entity { .. }) => {
                if affirmative {
                    context.confirm_pending_entity()?;
                    return Ok(false);
                }
                context.discard_pending_entity();
            }
            None => return Ok(false),
        }

        // Denied, and nothing left to do for the current goal
        if context.goal_is_met()? {
            context.reset();
            return Ok(true);
        }
        Ok(false)
    }

    /// Commits clearly understood entities. Among the uncertain ones, picks
    /// at most one to ask a confirmation for (mandatory slots first, then
    /// the most confident). Returns that confirmation request, if any.
    fn fill_slots(
        &self,
        entities: &[DetectedEntity],
        context: &mut Context,
        thresholds: Thresholds,
    ) -> Result<Option<Action>> {
        let mut candidate: Option<(&DetectedEntity, bool)> = None;

        for entity in entities {
            if entity.confidence >= thresholds.soft {
                context.set_slot(&entity.entity, entity.value.as_str())?;
            } else if entity.confidence >= thresholds.hard {
                let mandatory = context.current_goal().is_mandatory(&entity.entity);
                let better = match candidate {
                    None => true,
                    Some((best, best_mandatory)) => {
                        (mandatory && !best_mandatory)
                            || (mandatory == best_mandatory && entity.confidence > best.confidence)
                    }
                };
                if better {
                    candidate = Some((entity, mandatory));
                }
            } else {
                debug!("Dropping entity for slot '{}' (confidence {})", entity.entity, entity.confidence);
            }
        }

        let Some((entity, _)) = candidate else {
            return Ok(None);
        };
        if context.set_pending_entity(&entity.entity, entity.value.as_str())? {
            return Ok(Some(Action::ConfirmEntity {
                slot: entity.entity.clone(),
                value: entity.value.clone(),
            }));
        }
        debug!("Goal confirmation pending, not asking about slot '{}'", entity.entity);
        Ok(None)
    }

    /// If the goal is met, returns its actions; otherwise asks for the first
    /// missing mandatory slot.
    fn pursue_goal(&self, context: &mut Context) -> Result<Vec<Action>> {
        if let Some(slot) = context.lacking_slot()? {
            debug!("Goal '{}' is not met", context.current_goal().name);
            return Ok(vec![Action::AskSlotValue { slot }]);
        }

        let actions = context
            .current_goal()
            .actions
            .iter()
            .map(|name| self.factory.instantiate(name))
            .collect::<Result<Vec<_>>>()?;

        // Actions may discover they need an optional slot after all
        let mut promoted = false;
        for action in &actions {
            promoted |= self.factory.handler_for(action).promote_needed_optional_slots(context)?;
        }
        if promoted {
            if let Some(slot) = context.lacking_slot()? {
                debug!("Slot '{}' became mandatory for goal '{}'", slot, context.current_goal().name);
                return Ok(vec![Action::AskSlotValue { slot }]);
            }
        }

        info!("Goal '{}' is met", context.current_goal().name);
        Ok(actions)
    }

    /// Avoids asking the same kind of question over and over.
    /// A confirmation request past its cap becomes a rephrase request; a
    /// rephrase request past its cap becomes an invitation to start over.
    fn filter_repeated_requests(&self, actions: Vec<Action>, context: &mut Context) -> (Vec<Action>, bool) {
        let mut actions = actions;
        let mut rewritten = false;

        let capped_confirmation = match actions.last() {
            Some(last) if last.is_confirmation_request() && !context.may_ask_confirmation() => {
                Some(matches!(last, Action::ConfirmEntity { .. }))
            }
            _ => None,
        };
        if let Some(was_entity_confirmation) = capped_confirmation {
            // Nobody will answer that one
            if was_entity_confirmation {
                context.discard_pending_entity();
            }
            actions = vec![Action::AskRephrase];
            rewritten = true;
        }
        if matches!(actions.last(), Some(Action::AskRephrase)) && !context.may_ask_rephrase() {
            actions = vec![Action::AskStartOver];
            rewritten = true;
        }

        (actions, rewritten)
    }
}
