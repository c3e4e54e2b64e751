//! Grammar and spell-check overlays for rich-text editors.
//!
//! A [`Checker`] attaches to a host editor, waits until the user stops
//! typing, sends the document text to a LanguageTool server and decorates
//! every reported match. Activating a decoration opens a suggestion popup;
//! accepting a suggestion edits the document and keeps the remaining
//! matches aligned with it.

use std::collections::VecDeque;
use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::time::Instant;

mod checker;
mod debounce;
mod document;
mod editor;
mod error;
mod overlay;
pub(crate) mod settings;
pub(crate) mod types;

pub use checker::{CheckerClient, MatchSource};
pub use debounce::{
    ChangeDecision, DebounceController, SuppressionState, TypingState, SUPPRESSION_WINDOW,
};
pub use document::{extract, utf16_len, utf16_slice, utf16_to_byte, Edit, MatchStore};
pub use editor::{
    Attributes, ChangeOrigin, Delta, HostEditor, Insert, MemoryEditor, Op, Selection,
};
pub use error::{Error, Result};
pub use overlay::{
    clean_html, decorations, is_decorated, paint_decorations, remove_decorations, repaint,
    Decoration, LoadingIndicator, Placement, Popup, PopupManager, DECORATION_FORMAT,
    DECORATION_TAG, MAX_REPLACEMENTS,
};
pub use settings::{
    discover_settings, load_settings, parse_settings, CheckerSettings, Options, RequestEncoding,
    Settings, SETTINGS_FILE,
};
pub use types::{
    CheckRequest, CheckResponse, DecorationRef, Match, WireMatch, WireReplacement, WireRule,
};

/// Something that happened in the host, delivered to [`Checker::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The document changed.
    TextChange(ChangeOrigin),
    /// The user clicked a decoration.
    Activate(DecorationRef),
    /// The user picked a replacement in the open popup.
    ChooseReplacement(usize),
    /// Close button or a click outside the popup.
    ClosePopup,
    /// The window was resized.
    Resize,
    /// Run a check cycle now instead of waiting for the typing timer.
    CheckNow,
    /// Stop the event loop.
    Detach,
}

/// Why a check cycle did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The trimmed text has at most one character.
    TooShort,
    /// Another LanguageTool checker is attached to the page.
    ExternalChecker,
}

/// How a check cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    /// The store now holds this many matches, all decorated.
    Applied { matches: usize },
    /// The request failed; the store stays empty.
    NoResult,
    /// A newer cycle started while this one was in flight; its response was
    /// discarded.
    Stale,
}

/// A started check cycle whose response is still outstanding.
#[derive(Debug, Clone)]
pub struct CycleTicket {
    generation: u64,
    pub request: CheckRequest,
}

impl CycleTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

type PendingResponse = Pin<Box<dyn Future<Output = Result<CheckResponse>>>>;

struct InFlight {
    ticket: CycleTicket,
    response: PendingResponse,
}

/// Grammar checking attached to one editor instance.
pub struct Checker<E: HostEditor, S: MatchSource> {
    editor: E,
    source: S,
    options: Options,
    matches: MatchStore,
    debounce: DebounceController,
    popups: PopupManager,
    loader: LoadingIndicator,
    generation: u64,
    events_tx: mpsc::UnboundedSender<EditorEvent>,
    events_rx: mpsc::UnboundedReceiver<EditorEvent>,
    /// Host events set aside while text changes were drained at cycle start.
    deferred: VecDeque<EditorEvent>,
    /// Present once the host asked for the error channel.
    errors_tx: Option<mpsc::UnboundedSender<Error>>,
}

impl<E: HostEditor, S: MatchSource> Checker<E, S> {
    /// Attach to `editor`.
    ///
    /// Registers the decoration format, turns off native spellchecking when
    /// configured and subscribes to the editor's change notifications. Only
    /// user changes are queued; the checker's own edits never reach the
    /// typing timer.
    pub fn new(editor: E, source: S, options: Options) -> Self {
        tracing::debug!(
            language = %options.language,
            cooldown_ms = options.cooldown_time.as_millis() as u64,
            "attaching checker to editor"
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        editor.register_inline_format(DECORATION_FORMAT);
        if options.disable_native_spellcheck {
            editor.set_root_attribute("spellcheck", "false");
        }
        let notify = events_tx.clone();
        editor.subscribe_changes(Box::new(move |origin| {
            if origin == ChangeOrigin::User {
                let _ = notify.send(EditorEvent::TextChange(origin));
            }
        }));

        Self {
            debounce: DebounceController::new(options.cooldown_time, options.suppression_window),
            loader: LoadingIndicator::new(options.show_loading_indicator),
            editor,
            source,
            options,
            matches: MatchStore::new(),
            popups: PopupManager::new(),
            generation: 0,
            events_tx,
            events_rx,
            deferred: VecDeque::new(),
            errors_tx: None,
        }
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn matches(&self) -> &MatchStore {
        &self.matches
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popups.current()
    }

    pub fn debounce(&self) -> &DebounceController {
        &self.debounce
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_active()
    }

    /// Sender for host events consumed by [`Checker::run`].
    pub fn event_sender(&self) -> mpsc::UnboundedSender<EditorEvent> {
        self.events_tx.clone()
    }

    /// Receiver of fail-soft errors (failed requests, undecodable
    /// responses). Can be taken once.
    ///
    /// Errors are only reported from the moment the receiver is taken, and
    /// only while it is alive.
    pub fn take_error_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<Error>> {
        if self.errors_tx.is_some() {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.errors_tx = Some(tx);
        Some(rx)
    }

    /// Feed a change notification to the typing timer.
    pub fn on_text_change(&mut self, origin: ChangeOrigin) -> ChangeDecision {
        let decision = self.debounce.on_change(origin, Instant::now());
        if let ChangeDecision::Scheduled(_) = decision {
            tracing::trace!("text changed, typing timer restarted");
        }
        decision
    }

    /// The plain text the checker would see right now.
    pub fn text(&self) -> String {
        extract(&self.editor.root_html())
    }

    /// Start a check cycle: clear matches and decorations, show the loading
    /// indicator and build the request.
    ///
    /// Queued text changes are fed to the typing timer first, so keystrokes
    /// made before the cycle are not mistaken for the cycle's own edits.
    /// Apart from that, nothing changes when the cycle is skipped.
    pub fn begin_cycle(&mut self) -> std::result::Result<CycleTicket, SkipReason> {
        self.drain_text_changes();
        let text = self.text();
        if utf16_len(text.trim()) <= 1 {
            return Err(SkipReason::TooShort);
        }
        if self.editor.external_checker_attached() {
            tracing::debug!("LanguageTool is installed as extension, not checking");
            return Err(SkipReason::ExternalChecker);
        }

        tracing::debug!("checking spelling");
        // the text about to be sent already holds every queued keystroke
        self.debounce.cancel();
        self.generation += 1;
        self.popups.close();
        self.matches.clear();
        self.debounce.suppress(Instant::now());
        remove_decorations(&self.editor);
        self.loader.start(&self.editor);

        Ok(CycleTicket {
            generation: self.generation,
            request: CheckRequest::new(text, &self.options.language, &self.options.api_options),
        })
    }

    /// Finish a cycle with the checker's answer.
    ///
    /// Responses of superseded cycles are dropped untouched. A failed
    /// request leaves the store empty and is reported on the error channel.
    pub fn finish_cycle(
        &mut self,
        ticket: CycleTicket,
        response: Result<CheckResponse>,
    ) -> CycleOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding stale check response"
            );
            return CycleOutcome::Stale;
        }

        let outcome = match response {
            Ok(response) => {
                let dropped = self.matches.replace(response.into_matches());
                if dropped > 0 {
                    tracing::debug!(dropped, "checker returned overlapping matches");
                }
                if self.matches.is_empty() {
                    tracing::debug!("no matches found");
                }
                repaint(&self.editor, self.matches.as_slice(), &mut self.debounce);
                CycleOutcome::Applied {
                    matches: self.matches.len(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "check failed, treating as no matches");
                self.report(e);
                CycleOutcome::NoResult
            }
        };

        self.loader.stop(&self.editor);
        outcome
    }

    fn report(&mut self, error: Error) {
        let Some(tx) = &self.errors_tx else {
            return;
        };
        if tx.send(error).is_err() {
            tracing::debug!("error receiver dropped, no longer reporting errors");
            self.errors_tx = None;
        }
    }

    /// Feed every queued text change to the typing timer, keeping other
    /// events for later.
    fn drain_text_changes(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                EditorEvent::TextChange(origin) => {
                    self.on_text_change(origin);
                }
                other => self.deferred.push_back(other),
            }
        }
    }

    fn next_queued_event(&mut self) -> Option<EditorEvent> {
        self.deferred
            .pop_front()
            .or_else(|| self.events_rx.try_recv().ok())
    }

    /// Run one full check cycle.
    pub async fn check_spelling(&mut self) -> CycleOutcome {
        let ticket = match self.begin_cycle() {
            Ok(ticket) => ticket,
            Err(reason) => return CycleOutcome::Skipped(reason),
        };
        let response = self.source.check(ticket.request.clone()).await;
        self.finish_cycle(ticket, response)
    }

    /// Clear and repaint all decorations from the store.
    pub fn reload_decorations(&mut self) {
        repaint(&self.editor, self.matches.as_slice(), &mut self.debounce);
    }

    /// Open the popup for a clicked decoration.
    pub fn activate_decoration(&mut self, target: &DecorationRef) -> Result<&Popup> {
        self.popups.activate(&self.matches, target)
    }

    /// Accept replacement `index` of the open popup.
    pub fn apply_suggestion(&mut self, index: usize) -> Result<Edit> {
        self.popups
            .apply(&self.editor, &mut self.matches, &mut self.debounce, index)
    }

    pub fn close_popup(&mut self) {
        self.popups.close();
    }

    /// Re-layout the open popup, if any.
    pub fn on_resize(&mut self) -> Option<&Popup> {
        self.popups.reposition()
    }

    /// Handle every queued host event without waiting.
    ///
    /// For hosts that drive the checker by hand instead of through
    /// [`Checker::run`]; `CheckNow` and `Detach` are ignored here. Returns
    /// the number of events handled.
    pub fn pump_events(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Some(event) = self.next_queued_event() {
            self.handle_event(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    fn handle_event(&mut self, event: EditorEvent) -> Result<()> {
        match event {
            EditorEvent::TextChange(origin) => {
                self.on_text_change(origin);
            }
            EditorEvent::Activate(target) => {
                self.activate_decoration(&target)?;
            }
            EditorEvent::ChooseReplacement(index) => match self.apply_suggestion(index) {
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::warn!(error = %e, "ignoring replacement request"),
            },
            EditorEvent::ClosePopup => self.close_popup(),
            EditorEvent::Resize => {
                self.on_resize();
            }
            EditorEvent::CheckNow | EditorEvent::Detach => {}
        }
        Ok(())
    }
}

impl<E, S> Checker<E, S>
where
    E: HostEditor,
    S: MatchSource + Clone + 'static,
{
    /// Drive the checker from host events until [`EditorEvent::Detach`].
    ///
    /// Check requests run alongside event handling, so the user can keep
    /// typing while one is in flight. Starting a new cycle drops the
    /// previous request. Returns an error only for fatal inconsistencies.
    pub async fn run(&mut self) -> Result<()> {
        let mut in_flight: Option<InFlight> = None;

        loop {
            while let Some(event) = self.deferred.pop_front() {
                if self.dispatch(event, &mut in_flight)?.is_break() {
                    return Ok(());
                }
            }
            let deadline = self.debounce.deadline();

            tokio::select! {
                event = self.events_rx.recv() => {
                    let Some(event) = event else {
                        return Ok(());
                    };
                    if self.dispatch(event, &mut in_flight)?.is_break() {
                        return Ok(());
                    }
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.debounce.fire_if_due(Instant::now()) {
                        tracing::debug!("user stopped typing, checking spelling");
                        self.launch_cycle(&mut in_flight);
                    }
                }
                response = settle(&mut in_flight), if in_flight.is_some() => {
                    if let Some(done) = in_flight.take() {
                        self.finish_cycle(done.ticket, response);
                    }
                }
            }
        }
    }

    fn dispatch(
        &mut self,
        event: EditorEvent,
        in_flight: &mut Option<InFlight>,
    ) -> Result<ControlFlow<()>> {
        match event {
            EditorEvent::Detach => return Ok(ControlFlow::Break(())),
            EditorEvent::CheckNow => {
                self.debounce.cancel();
                self.launch_cycle(in_flight);
            }
            event => {
                if let Err(e) = self.handle_event(event) {
                    // the pending request dies with the loop
                    self.loader.stop(&self.editor);
                    return Err(e);
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn launch_cycle(&mut self, in_flight: &mut Option<InFlight>) {
        match self.begin_cycle() {
            Ok(ticket) => {
                let source = self.source.clone();
                let request = ticket.request.clone();
                *in_flight = Some(InFlight {
                    ticket,
                    response: Box::pin(async move { source.check(request).await }),
                });
            }
            Err(reason) => tracing::debug!(?reason, "skipping check cycle"),
        }
    }
}

/// Wait for the in-flight response, or forever when there is none.
async fn settle(in_flight: &mut Option<InFlight>) -> Result<CheckResponse> {
    match in_flight {
        Some(pending) => pending.response.as_mut().await,
        None => std::future::pending().await,
    }
}
