use std::{sync::Arc, time::Duration};

use crate::{
    client::Shortener,
    model::{ShortenRequest, Ttl, View},
    render::{Rendered, Renderer},
    throttle::{self, Throttle, ThrottleState},
};

/// ResultDisplay is the single region outcomes are written to.
pub trait ResultDisplay: Send + Sync + 'static {
    fn show(&self, rendered: Rendered);
}

/// OptionPanel is the list of TTL options and the container that hides it.
pub trait OptionPanel {
    /// Marks option `index` as selected and clears the mark from every other option.
    fn mark_selected(&mut self, index: usize);
    fn set_shown(&mut self, shown: bool);
}

/// SubmissionController turns submit actions into throttled shortening calls
/// and writes their outcome to the display.
pub struct SubmissionController<P: OptionPanel> {
    selected: Ttl,
    panel_shown: bool,
    panel: P,
    sender: Throttle<ShortenRequest>,
}

impl<P: OptionPanel> SubmissionController<P> {
    pub fn new<S, D>(shortener: S, display: D, panel: P) -> Self
    where
        S: Shortener,
        D: ResultDisplay,
    {
        Self::with_delay(throttle::DEFAULT_DELAY, shortener, display, panel)
    }

    pub fn with_delay<S, D>(delay: Duration, shortener: S, display: D, mut panel: P) -> Self
    where
        S: Shortener,
        D: ResultDisplay,
    {
        let selected = Ttl::default();
        panel.mark_selected(selected.index());
        panel.set_shown(false);

        let shortener = Arc::new(shortener);
        let display = Arc::new(display);
        let renderer = Arc::new(Renderer::new());
        let sender = throttle::throttle(delay, move |request: ShortenRequest| {
            send_request(Arc::clone(&shortener), Arc::clone(&display), Arc::clone(&renderer), request)
        });

        Self {
            selected,
            panel_shown: false,
            panel,
            sender,
        }
    }

    pub fn selected_ttl(&self) -> Ttl {
        self.selected
    }

    pub fn panel_shown(&self) -> bool {
        self.panel_shown
    }

    pub fn sender_state(&self) -> ThrottleState {
        self.sender.state()
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn select_ttl(&mut self, index: usize) {
        let Some(ttl) = Ttl::from_index(index) else {
            tracing::warn!("ignoring ttl option index out of range: {}", index);
            return;
        };
        tracing::debug!("selected ttl: {} ({}s)", ttl, ttl.seconds());
        self.selected = ttl;
        self.panel.mark_selected(index);
    }

    pub fn toggle_option_panel(&mut self) {
        self.panel_shown = !self.panel_shown;
        self.panel.set_shown(self.panel_shown);
    }

    pub fn close_option_panel(&mut self) {
        self.panel_shown = false;
        self.panel.set_shown(false);
    }

    /// Hands the origin to the throttled sender, then closes the option panel.
    ///
    /// An absent or empty origin is ignored without any visible effect.
    /// Returns true when this submit armed a request.
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, origin: Option<&str>) -> bool {
        let origin = match origin {
            Some(origin) if !origin.is_empty() => origin,
            _ => {
                tracing::trace!("empty origin, submit ignored");
                return false;
            }
        };
        let request = ShortenRequest::new(origin, self.selected);
        let armed = self.sender.call(request);
        if !armed {
            tracing::debug!("submit dropped, a request is already armed");
        }
        self.close_option_panel();
        armed
    }
}

/// Shows the processing notice right away and resolves the call in the background.
///
/// Overlapping calls are not cancelled; whichever resolves last owns the display.
fn send_request<S, D>(shortener: Arc<S>, display: Arc<D>, renderer: Arc<Renderer>, request: ShortenRequest)
where
    S: Shortener,
    D: ResultDisplay,
{
    tracing::info!("shortening: {}", &request);
    display.show(renderer.render(&View::processing()));
    tokio::spawn(async move {
        let view = match shortener.shorten(&request).await {
            Ok(short) => {
                tracing::info!("short link: {} -> {}", &request.origin, &short);
                View::Link(short)
            }
            Err(e) => {
                tracing::error!("{e}");
                View::Error(e.to_string())
            }
        };
        display.show(renderer.render(&view));
    });
}
