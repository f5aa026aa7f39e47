// src/session.rs
use log::{info, warn};
use std::time::{Duration, Instant};

use crate::ai::connector::AiConnector;
use crate::convert::{generate, ConversionOutcome, FailureKind};
use crate::input::clipboard::ClipboardItem;
use crate::input::{ImageCandidate, InputController, PreviewHost, SelectedImage};

pub const COPY_ACK_DURATION: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiState {
    Idle,
    Ready,
    InFlight,
    Resolved,
}

/// A conversion handed out by [`Session::begin_generation`]. The image is a
/// snapshot, so the worker never touches the session.
#[derive(Debug)]
pub struct ConversionJob {
    pub ticket: u64,
    pub image: SelectedImage,
}

/// What `begin_generation` decided.
#[derive(Debug)]
pub enum Trigger {
    Started(ConversionJob),
    /// Resolved on the spot (nothing selected); no remote call needed.
    Finished,
    /// A conversion is already running.
    Busy,
}

/// The one image/outcome pair of a window, plus the in-flight ticket.
/// Input errors share the outcome slot so only one message shows at a time.
pub struct Session<P: PreviewHost> {
    input: InputController<P>,
    outcome: Option<ConversionOutcome>,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl<P: PreviewHost> Session<P> {
    pub fn new(host: P) -> Self {
        Self {
            input: InputController::new(host),
            outcome: None,
            in_flight: None,
            next_ticket: 0,
        }
    }

    pub fn ui_state(&self) -> UiState {
        if self.in_flight.is_some() {
            UiState::InFlight
        } else if !self.input.has_image() {
            UiState::Idle
        } else if self.outcome.is_some() {
            UiState::Resolved
        } else {
            UiState::Ready
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_ticket(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn can_generate(&self) -> bool {
        self.input.has_image() && !self.is_in_flight()
    }

    pub fn outcome(&self) -> Option<&ConversionOutcome> {
        self.outcome.as_ref()
    }

    pub fn input(&self) -> &InputController<P> {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputController<P> {
        &mut self.input
    }

    /// Explicit submit path: a rejected candidate shows the invalid-input
    /// message, an accepted one wipes any previous result or error.
    pub fn submit_candidate(&mut self, candidate: ImageCandidate) -> bool {
        if self.refuse_while_in_flight("submit") {
            return false;
        }
        let accepted = self.input.submit_candidate(candidate).is_ok();
        self.note_submission(accepted);
        accepted
    }

    pub fn handle_drop(&mut self, files: Vec<ImageCandidate>) -> bool {
        if self.refuse_while_in_flight("drop") {
            self.input.set_dragging(false);
            return false;
        }
        match self.input.handle_drop(files) {
            Some(result) => {
                let accepted = result.is_ok();
                self.note_submission(accepted);
                accepted
            }
            None => false,
        }
    }

    /// Paste never reports an error; it either takes an image or does nothing.
    pub fn handle_paste(&mut self, text_field_focused: bool, items: &[ClipboardItem]) -> bool {
        if text_field_focused || self.refuse_while_in_flight("paste") {
            return false;
        }
        let accepted = self.input.handle_paste(false, items);
        if accepted {
            self.outcome = None;
        }
        accepted
    }

    /// Back to idle. Refused while a conversion is running.
    pub fn clear(&mut self) -> bool {
        if self.refuse_while_in_flight("clear") {
            return false;
        }
        self.input.clear();
        self.outcome = None;
        true
    }

    pub fn begin_generation(&mut self) -> Trigger {
        if self.is_in_flight() {
            warn!("Conversion already running; trigger ignored");
            return Trigger::Busy;
        }
        let Some(image) = self.input.selected().cloned() else {
            self.outcome = Some(ConversionOutcome::failure(FailureKind::NoImageSelected));
            return Trigger::Finished;
        };

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight = Some(ticket);
        self.outcome = None;
        info!("Conversion #{} started for '{}'", ticket, image.name());
        Trigger::Started(ConversionJob { ticket, image })
    }

    /// Store the outcome of a job. Tickets that are not the running one are
    /// dropped; returns whether the outcome was applied.
    pub fn finish_generation(&mut self, ticket: u64, outcome: ConversionOutcome) -> bool {
        if self.in_flight != Some(ticket) {
            warn!("Dropping outcome of stale conversion #{}", ticket);
            return false;
        }
        match &outcome {
            ConversionOutcome::Success(_) => info!("Conversion #{} succeeded", ticket),
            ConversionOutcome::Failure { kind, .. } => info!("Conversion #{} failed: {:?}", ticket, kind),
        }
        self.in_flight = None;
        self.outcome = Some(outcome);
        true
    }

    /// Run a whole conversion on the calling thread.
    pub fn generate_blocking(&mut self, connector: &dyn AiConnector) -> Option<&ConversionOutcome> {
        if let Trigger::Started(job) = self.begin_generation() {
            let outcome = generate(Some(&job.image), connector);
            self.finish_generation(job.ticket, outcome);
        }
        self.outcome.as_ref()
    }

    fn note_submission(&mut self, accepted: bool) {
        self.outcome = if accepted {
            None
        } else {
            Some(ConversionOutcome::failure(FailureKind::InvalidInput))
        };
    }

    fn refuse_while_in_flight(&self, action: &str) -> bool {
        if self.is_in_flight() {
            warn!("Ignoring {} while a conversion is running", action);
            true
        } else {
            false
        }
    }
}

/// Short-lived "Copied!" acknowledgement after copying the LaTeX.
#[derive(Debug, Default)]
pub struct CopyFeedback {
    copied_at: Option<Instant>,
}

impl CopyFeedback {
    pub fn mark_copied(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    pub fn is_showing(&self, now: Instant) -> bool {
        self.copied_at
            .map(|at| now.saturating_duration_since(at) < COPY_ACK_DURATION)
            .unwrap_or(false)
    }

    /// Time left before the acknowledgement reverts, for scheduling a repaint.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let at = self.copied_at?;
        COPY_ACK_DURATION.checked_sub(now.saturating_duration_since(at)).filter(|d| !d.is_zero())
    }

    pub fn reset(&mut self) {
        self.copied_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::orchestrator::tests::ScriptedConnector;
    use crate::input::controller::tests::{png, RecordingPreview};

    fn text_file() -> ImageCandidate {
        ImageCandidate::from_bytes("notes.txt", "text/plain", b"hi".to_vec())
    }

    fn session() -> Session<RecordingPreview> {
        Session::new(RecordingPreview::default())
    }

    #[test]
    fn test_starts_idle() {
        let session = session();
        assert_eq!(session.ui_state(), UiState::Idle);
        assert!(session.outcome().is_none());
        assert!(!session.can_generate());
    }

    #[test]
    fn test_valid_image_moves_to_ready_without_error() {
        let mut session = session();
        assert!(session.submit_candidate(png("eq.png", 2 * 1024 * 1024)));
        assert_eq!(session.ui_state(), UiState::Ready);
        assert!(session.outcome().is_none());
        assert!(session.can_generate());
    }

    #[test]
    fn test_text_file_sets_invalid_input_message() {
        let mut session = session();
        assert!(!session.submit_candidate(text_file()));
        assert_eq!(session.ui_state(), UiState::Idle);
        assert!(session.input().selected().is_none());
        assert_eq!(
            session.outcome().and_then(|o| o.error_message()),
            Some("Please select or paste a valid image file.")
        );
    }

    #[test]
    fn test_rejected_drop_shows_invalid_input_message() {
        let mut session = session();
        session.input_mut().set_dragging(true);
        assert!(!session.handle_drop(vec![text_file()]));
        assert!(!session.input().is_dragging());
        assert_eq!(session.ui_state(), UiState::Idle);
        assert_eq!(
            session.outcome().and_then(|o| o.error_message()),
            Some("Please select or paste a valid image file.")
        );
    }

    #[test]
    fn test_valid_submit_clears_previous_error() {
        let mut session = session();
        session.submit_candidate(text_file());
        session.submit_candidate(png("eq.png", 1));
        assert!(session.outcome().is_none());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut session = session();
        session.submit_candidate(png("eq.png", 1));

        let job = match session.begin_generation() {
            Trigger::Started(job) => job,
            other => panic!("expected a job, got {other:?}"),
        };
        assert_eq!(session.ui_state(), UiState::InFlight);
        assert!(!session.can_generate());

        assert!(session.finish_generation(job.ticket, ConversionOutcome::Success("x^2".into())));
        assert_eq!(session.ui_state(), UiState::Resolved);
        assert_eq!(session.outcome().and_then(|o| o.latex()), Some("x^2"));

        session.submit_candidate(png("next.png", 1));
        assert_eq!(session.ui_state(), UiState::Ready);

        assert!(session.clear());
        assert_eq!(session.ui_state(), UiState::Idle);
    }

    #[test]
    fn test_second_trigger_while_in_flight_is_busy() {
        let mut session = session();
        session.submit_candidate(png("eq.png", 1));
        assert!(matches!(session.begin_generation(), Trigger::Started(_)));
        assert!(matches!(session.begin_generation(), Trigger::Busy));
    }

    #[test]
    fn test_inputs_and_clear_refused_while_in_flight() {
        let preview = RecordingPreview::default();
        let mut session = Session::new(preview.clone());
        session.submit_candidate(png("eq.png", 1));
        let Trigger::Started(job) = session.begin_generation() else {
            panic!("expected a job");
        };

        assert!(!session.clear());
        assert!(!session.submit_candidate(png("other.png", 1)));
        assert!(!session.handle_paste(false, &[ClipboardItem::file(png("pasted.png", 1))]));
        assert!(!session.handle_drop(vec![png("dropped.png", 1)]));
        assert_eq!(session.input().selected().unwrap().name(), "eq.png");
        assert_eq!(preview.log.borrow().created.len(), 1);

        assert!(session.finish_generation(job.ticket, ConversionOutcome::Success("y".into())));
        assert!(session.clear());
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut session = session();
        session.submit_candidate(png("eq.png", 1));
        let Trigger::Started(job) = session.begin_generation() else {
            panic!("expected a job");
        };
        assert!(!session.finish_generation(job.ticket + 7, ConversionOutcome::Success("nope".into())));
        assert_eq!(session.ui_state(), UiState::InFlight);
    }

    #[test]
    fn test_generate_without_image_resolves_immediately() {
        let mut session = session();
        let connector = ScriptedConnector::replying("x");
        let outcome = session.generate_blocking(&connector).cloned();
        assert_eq!(outcome.and_then(|o| o.failure_kind()), Some(FailureKind::NoImageSelected));
        assert_eq!(connector.call_count(), 0);
        assert!(!session.is_in_flight());
    }

    #[test]
    fn test_generate_blocking_success() {
        let mut session = session();
        session.submit_candidate(png("eq.png", 1));
        let connector = ScriptedConnector::replying("  a + b \n");
        let outcome = session.generate_blocking(&connector).cloned();
        assert_eq!(outcome, Some(ConversionOutcome::Success("a + b".into())));
        assert_eq!(session.ui_state(), UiState::Resolved);
    }

    #[test]
    fn test_clear_always_lands_in_idle() {
        let connector = ScriptedConnector::failing(500, "boom");

        let mut resolved = session();
        resolved.submit_candidate(png("eq.png", 1));
        resolved.generate_blocking(&connector);
        assert_eq!(resolved.ui_state(), UiState::Resolved);

        let mut errored = session();
        errored.submit_candidate(text_file());

        for mut session in [resolved, errored] {
            assert!(session.clear());
            assert!(session.clear());
            assert_eq!(session.ui_state(), UiState::Idle);
            assert!(session.outcome().is_none());
            assert!(session.input().selected().is_none());
        }
    }

    #[test]
    fn test_paste_focus_and_silence() {
        let mut session = session();
        let pasted = [ClipboardItem::file(png("pasted.png", 1))];
        assert!(!session.handle_paste(true, &pasted));
        assert_eq!(session.ui_state(), UiState::Idle);

        assert!(!session.handle_paste(false, &[ClipboardItem::text()]));
        assert!(session.outcome().is_none());

        assert!(session.handle_paste(false, &pasted));
        assert_eq!(session.ui_state(), UiState::Ready);
    }

    #[test]
    fn test_copy_feedback_expires() {
        let start = Instant::now();
        let mut feedback = CopyFeedback::default();
        assert!(!feedback.is_showing(start));

        feedback.mark_copied(start);
        assert!(feedback.is_showing(start + Duration::from_millis(500)));
        assert!(feedback.remaining(start + Duration::from_millis(500)).is_some());
        assert!(!feedback.is_showing(start + COPY_ACK_DURATION));
        assert!(feedback.remaining(start + COPY_ACK_DURATION).is_none());

        feedback.mark_copied(start);
        feedback.reset();
        assert!(!feedback.is_showing(start));
    }
}
