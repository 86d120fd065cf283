use crate::config::ProvidersConfig;
use crate::error::{Result, TixError};
use crate::status::ExternalStatus;
use crate::ticket::Ticket;

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// External build server capability.
pub trait BuildProvider {
    /// Current result for the ticket's outstanding build.
    fn status(&self, ticket: &Ticket) -> Result<ExternalStatus>;

    /// Whether builds are triggered automatically on push.
    fn is_auto(&self) -> bool;
}

/// External code review capability.
pub trait ReviewProvider {
    /// Current result for the given review id.
    fn status(&self, review_id: &str) -> Result<ExternalStatus>;

    /// Whether reviews progress without manual polling.
    fn is_auto(&self) -> bool;
}

/// Release process capability.
pub trait ReleaseGate {
    /// When true, a `Ready` ticket can advance straight to `Done`.
    fn can_be_skipped(&self, ticket: &Ticket) -> Result<bool>;
}

/// Remote issue tracker capability.
pub trait TicketingProvider {
    fn ticket_url(&self, ticket: &Ticket) -> Option<String>;

    /// Whether new tickets can be created locally (vs. fetched from remote).
    fn can_create(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Default implementations
// ---------------------------------------------------------------------------

/// No build server configured: every build is instantly successful.
pub struct NoBuild;

impl BuildProvider for NoBuild {
    fn status(&self, _ticket: &Ticket) -> Result<ExternalStatus> {
        Ok(ExternalStatus::Success)
    }

    fn is_auto(&self) -> bool {
        false
    }
}

/// No review system configured: every review is instantly successful.
pub struct NoReview;

impl ReviewProvider for NoReview {
    fn status(&self, _review_id: &str) -> Result<ExternalStatus> {
        Ok(ExternalStatus::Success)
    }

    fn is_auto(&self) -> bool {
        false
    }
}

/// No release process configured: releasing can always be skipped.
pub struct NoRelease;

impl ReleaseGate for NoRelease {
    fn can_be_skipped(&self, _ticket: &Ticket) -> Result<bool> {
        Ok(true)
    }
}

/// Tickets are managed by hand, with an optional per-ticket URL.
pub struct ManualTicketing;

impl TicketingProvider for ManualTicketing {
    fn ticket_url(&self, ticket: &Ticket) -> Option<String> {
        ticket.url.clone()
    }

    fn can_create(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The full set of backends for one invocation, resolved from configuration
/// strings. Concrete service integrations register here; the core ships only
/// the `no`/`manual` implementations.
pub struct Providers {
    pub build: Box<dyn BuildProvider>,
    pub review: Box<dyn ReviewProvider>,
    pub release: Box<dyn ReleaseGate>,
    pub ticketing: Box<dyn TicketingProvider>,
}

impl Providers {
    pub fn from_config(cfg: &ProvidersConfig) -> Result<Self> {
        Ok(Self {
            build: build_provider(&cfg.building)?,
            review: review_provider(&cfg.reviewing)?,
            release: release_gate(&cfg.releasing)?,
            ticketing: ticketing_provider(&cfg.ticketing)?,
        })
    }
}

pub fn build_provider(name: &str) -> Result<Box<dyn BuildProvider>> {
    match name {
        "none" => Ok(Box::new(NoBuild)),
        _ => Err(unknown("building", name)),
    }
}

pub fn review_provider(name: &str) -> Result<Box<dyn ReviewProvider>> {
    match name {
        "none" => Ok(Box::new(NoReview)),
        _ => Err(unknown("reviewing", name)),
    }
}

pub fn release_gate(name: &str) -> Result<Box<dyn ReleaseGate>> {
    match name {
        "none" => Ok(Box::new(NoRelease)),
        _ => Err(unknown("releasing", name)),
    }
}

pub fn ticketing_provider(name: &str) -> Result<Box<dyn TicketingProvider>> {
    match name {
        "manual" => Ok(Box::new(ManualTicketing)),
        _ => Err(unknown("ticketing", name)),
    }
}

fn unknown(concern: &str, provider: &str) -> TixError {
    TixError::UnknownProvider {
        concern: concern.to_string(),
        provider: provider.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_resolves() {
        let providers = Providers::from_config(&ProvidersConfig::default()).unwrap();
        let ticket = Ticket::new("1234", "Test");
        assert_eq!(
            providers.build.status(&ticket).unwrap(),
            ExternalStatus::Success
        );
        assert_eq!(
            providers.review.status("r-1").unwrap(),
            ExternalStatus::Success
        );
        assert!(providers.release.can_be_skipped(&ticket).unwrap());
        assert!(providers.ticketing.can_create());
    }

    #[test]
    fn unknown_provider_rejected() {
        let cfg = ProvidersConfig {
            building: "jenkins".to_string(),
            ..ProvidersConfig::default()
        };
        assert!(matches!(
            Providers::from_config(&cfg),
            Err(TixError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn manual_ticketing_echoes_url() {
        let mut ticket = Ticket::new("1234", "Test");
        ticket.url = Some("https://tracker/1234".to_string());
        assert_eq!(
            ManualTicketing.ticket_url(&ticket).as_deref(),
            Some("https://tracker/1234")
        );
    }
}
