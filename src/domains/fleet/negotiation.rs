use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use super::ports::ParticipantId;

const REINTERRUPT_COOLDOWN: Duration = Duration::from_secs(10);

/// View of the negotiation table offered to a responder.
#[derive(Debug, Clone, Default)]
pub struct NegotiationView {
    pub participants: Vec<ParticipantId>,
}

/// Channel through which a negotiator answers a negotiation round.
pub trait NegotiationResponder: Send + Sync {
    fn submit(&self, itinerary: Vec<ParticipantId>);
    fn forfeit(&self);
}

/// Schedule-negotiation capability of a single participant.
pub trait Negotiator: Send + Sync {
    fn respond(&self, view: &NegotiationView, responder: &dyn NegotiationResponder);
}

/// Forwards negotiation rounds to an upstream negotiator held weakly. If
/// the upstream is gone the liaison forfeits instead of dereferencing a
/// dead pointer.
pub struct LiaisonNegotiator {
    upstream: Weak<dyn Negotiator>,
}

impl LiaisonNegotiator {
    pub fn new(upstream: Weak<dyn Negotiator>) -> Self {
        Self { upstream }
    }
}

impl Negotiator for LiaisonNegotiator {
    fn respond(&self, view: &NegotiationView, responder: &dyn NegotiationResponder) {
        match self.upstream.upgrade() {
            Some(negotiator) => negotiator.respond(view, responder),
            None => responder.forfeit(),
        }
    }
}

struct Registration {
    negotiator: Box<dyn Negotiator>,
    on_interrupt: Box<dyn Fn() + Send + Sync>,
}

/// Registry of negotiators keyed by traffic participant. Holds the only
/// strong reference to each liaison; robot contexts are reached through
/// the liaison's weak upstream pointer.
#[derive(Default)]
pub struct NegotiationRoom {
    registrations: Mutex<HashMap<ParticipantId, Registration>>,
}

impl NegotiationRoom {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register_negotiator(
        self: &Arc<Self>,
        participant: ParticipantId,
        negotiator: Box<dyn Negotiator>,
        on_interrupt: Box<dyn Fn() + Send + Sync>,
    ) -> NegotiationLicense {
        self.registrations
            .lock()
            .unwrap()
            .insert(participant, Registration { negotiator, on_interrupt });
        NegotiationLicense { room: Arc::downgrade(self), participant }
    }

    /// Dispatches a negotiation round to the registered negotiator, if any.
    pub fn respond(
        &self,
        participant: ParticipantId,
        view: &NegotiationView,
        responder: &dyn NegotiationResponder,
    ) {
        let registrations = self.registrations.lock().unwrap();
        if let Some(registration) = registrations.get(&participant) {
            registration.negotiator.respond(view, responder);
        } else {
            responder.forfeit();
        }
    }

    pub fn interrupt(&self, participant: ParticipantId) {
        let registrations = self.registrations.lock().unwrap();
        if let Some(registration) = registrations.get(&participant) {
            (registration.on_interrupt)();
        }
    }

    fn unregister(&self, participant: ParticipantId) {
        self.registrations.lock().unwrap().remove(&participant);
    }
}

/// Keeps a negotiator registered for as long as it is held.
pub struct NegotiationLicense {
    room: Weak<NegotiationRoom>,
    participant: ParticipantId,
}

impl Drop for NegotiationLicense {
    fn drop(&mut self) {
        if let Some(room) = self.room.upgrade() {
            room.unregister(self.participant);
        }
    }
}

/// Wraps an interrupt trigger so repeated schedule conflicts re-interrupt
/// a robot at most once per cooldown window.
pub fn rate_limited_interrupt(
    trigger: impl Fn() + Send + Sync + 'static,
) -> Box<dyn Fn() + Send + Sync> {
    let last_interrupt: Mutex<Option<Instant>> = Mutex::new(None);
    Box::new(move || {
        let mut last = last_interrupt.lock().unwrap();
        let now = Instant::now();
        if let Some(previous) = *last {
            if now < previous + REINTERRUPT_COOLDOWN {
                return;
            }
        }
        *last = Some(now);
        trigger();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResponder {
        forfeits: AtomicUsize,
        submissions: AtomicUsize,
    }

    impl CountingResponder {
        fn new() -> Self {
            Self {
                forfeits: AtomicUsize::new(0),
                submissions: AtomicUsize::new(0),
            }
        }
    }

    impl NegotiationResponder for CountingResponder {
        fn submit(&self, _itinerary: Vec<ParticipantId>) {
            self.submissions.fetch_add(1, Ordering::SeqCst);
        }

        fn forfeit(&self) {
            self.forfeits.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct EagerNegotiator;

    impl Negotiator for EagerNegotiator {
        fn respond(
            &self,
            view: &NegotiationView,
            responder: &dyn NegotiationResponder,
        ) {
            responder.submit(view.participants.clone());
        }
    }

    #[test]
    fn liaison_forwards_while_upstream_lives() {
        let upstream: Arc<dyn Negotiator> = Arc::new(EagerNegotiator);
        let liaison = LiaisonNegotiator::new(Arc::downgrade(&upstream));
        let responder = CountingResponder::new();

        liaison.respond(&NegotiationView::default(), &responder);
        assert_eq!(responder.submissions.load(Ordering::SeqCst), 1);
        assert_eq!(responder.forfeits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn liaison_forfeits_after_upstream_drops() {
        let upstream: Arc<dyn Negotiator> = Arc::new(EagerNegotiator);
        let liaison = LiaisonNegotiator::new(Arc::downgrade(&upstream));
        drop(upstream);

        let responder = CountingResponder::new();
        liaison.respond(&NegotiationView::default(), &responder);
        assert_eq!(responder.submissions.load(Ordering::SeqCst), 0);
        assert_eq!(responder.forfeits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn license_drop_unregisters() {
        let room = NegotiationRoom::new();
        let license = room.register_negotiator(
            7,
            Box::new(EagerNegotiator),
            Box::new(|| {}),
        );

        let responder = CountingResponder::new();
        room.respond(7, &NegotiationView::default(), &responder);
        assert_eq!(responder.submissions.load(Ordering::SeqCst), 1);

        drop(license);
        room.respond(7, &NegotiationView::default(), &responder);
        assert_eq!(responder.forfeits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn interrupts_are_rate_limited() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let interrupt = rate_limited_interrupt(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        interrupt();
        interrupt();
        interrupt();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
