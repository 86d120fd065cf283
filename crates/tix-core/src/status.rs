use crate::error::TixError;
use std::fmt;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a ticket. `Building` and `Reviewing` are two
/// concurrent sub-processes sharing one slot; `BuildingReviewing` is their
/// composite when both are outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    New,
    Watching,
    Started,
    Working,
    Building,
    Reviewing,
    BuildingReviewing,
    Waiting,
    Ready,
    Done,
    Canceled,
}

impl Status {
    pub fn all() -> &'static [Status] {
        &[
            Status::New,
            Status::Watching,
            Status::Started,
            Status::Working,
            Status::Building,
            Status::Reviewing,
            Status::BuildingReviewing,
            Status::Waiting,
            Status::Ready,
            Status::Done,
            Status::Canceled,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::New => "New",
            Status::Watching => "Watching",
            Status::Started => "Started",
            Status::Working => "Working",
            Status::Building => "Building",
            Status::Reviewing => "Reviewing",
            Status::BuildingReviewing => "Building + Reviewing",
            Status::Waiting => "Waiting",
            Status::Ready => "Ready",
            Status::Done => "Done",
            Status::Canceled => "Canceled",
        }
    }

    /// Terminal statuses close the ticket; refresh skips them entirely.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Canceled)
    }

    /// Whether a build sub-process is part of this status.
    pub fn has_building(self) -> bool {
        matches!(self, Status::Building | Status::BuildingReviewing)
    }

    /// Whether a review sub-process is part of this status.
    pub fn has_reviewing(self) -> bool {
        matches!(self, Status::Reviewing | Status::BuildingReviewing)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = TixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Status::New),
            "Watching" => Ok(Status::Watching),
            "Started" => Ok(Status::Started),
            "Working" => Ok(Status::Working),
            "Building" => Ok(Status::Building),
            "Reviewing" => Ok(Status::Reviewing),
            "Building + Reviewing" => Ok(Status::BuildingReviewing),
            "Waiting" => Ok(Status::Waiting),
            "Ready" => Ok(Status::Ready),
            "Done" => Ok(Status::Done),
            "Canceled" => Ok(Status::Canceled),
            _ => Err(TixError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Legal destination statuses from the current status. `None` is the initial
/// pseudo-state of a ticket that has never been assigned a status.
pub fn allowed_from(current: Option<Status>) -> &'static [Status] {
    match current {
        None => &[Status::New, Status::Watching, Status::Started],
        Some(Status::New) => &[Status::Started],
        Some(Status::Watching) => &[Status::Waiting],
        Some(Status::Started) => &[Status::Working, Status::Canceled],
        Some(Status::Working) => &[
            Status::Building,
            Status::Reviewing,
            Status::Canceled,
            Status::Waiting,
        ],
        Some(Status::Building) => &[Status::BuildingReviewing, Status::Working, Status::Waiting],
        Some(Status::Reviewing) => &[Status::BuildingReviewing, Status::Working, Status::Waiting],
        Some(Status::BuildingReviewing) => &[Status::Building, Status::Reviewing, Status::Working],
        Some(Status::Waiting) => &[
            Status::Reviewing,
            Status::Building,
            Status::Ready,
            Status::Canceled,
            Status::Working,
        ],
        Some(Status::Ready) => &[Status::Done, Status::Working],
        Some(Status::Done) => &[Status::Working],
        Some(Status::Canceled) => &[Status::Working],
    }
}

// ---------------------------------------------------------------------------
// StatusChange
// ---------------------------------------------------------------------------

/// A requested status change: either a concrete target, or one of the two
/// pseudo-values marking the end of a build/review sub-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    To(Status),
    EndBuilding,
    EndReviewing,
}

impl StatusChange {
    /// Resolve the request against the current status into a concrete target.
    ///
    /// `EndBuilding`/`EndReviewing` drop the finished sub-process out of a
    /// composite status; if current is `Building` and the target is
    /// `Reviewing` (or vice versa) the two compose instead of overwriting
    /// each other.
    pub fn resolve(self, current: Option<Status>) -> Status {
        let target = match self {
            StatusChange::To(s) => s,
            StatusChange::EndBuilding => match current {
                Some(Status::BuildingReviewing) => Status::Reviewing,
                Some(Status::Working) => Status::Working,
                _ => Status::Waiting,
            },
            StatusChange::EndReviewing => match current {
                Some(Status::BuildingReviewing) => Status::Building,
                Some(Status::Working) => Status::Working,
                _ => Status::Waiting,
            },
        };
        match (current, target) {
            (Some(Status::Building), Status::Reviewing)
            | (Some(Status::Reviewing), Status::Building) => Status::BuildingReviewing,
            _ => target,
        }
    }
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusChange::To(s) => f.write_str(s.as_str()),
            StatusChange::EndBuilding => f.write_str("End Building"),
            StatusChange::EndReviewing => f.write_str("End Reviewing"),
        }
    }
}

impl std::str::FromStr for StatusChange {
    type Err = TixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "End Building" => Ok(StatusChange::EndBuilding),
            "End Reviewing" => Ok(StatusChange::EndReviewing),
            _ => s.parse().map(StatusChange::To),
        }
    }
}

// ---------------------------------------------------------------------------
// ExternalStatus
// ---------------------------------------------------------------------------

/// Outcome reported by a build or review provider. Providers may report
/// partial progress as `"<n>/<m>"`; anything else outside the fixed values
/// is a hard error, never coerced to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalStatus {
    Pending,
    Success,
    Fail,
    Progress { done: u32, total: u32 },
}

impl ExternalStatus {
    /// A settled result will not change on its own; refresh stops polling.
    pub fn is_settled(self) -> bool {
        matches!(self, ExternalStatus::Success | ExternalStatus::Fail)
    }
}

impl fmt::Display for ExternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalStatus::Pending => f.write_str("Pending"),
            ExternalStatus::Success => f.write_str("Success"),
            ExternalStatus::Fail => f.write_str("Fail"),
            ExternalStatus::Progress { done, total } => write!(f, "{done}/{total}"),
        }
    }
}

impl std::str::FromStr for ExternalStatus {
    type Err = TixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ExternalStatus::Pending),
            "Success" => Ok(ExternalStatus::Success),
            "Fail" => Ok(ExternalStatus::Fail),
            _ => {
                if let Some((done, total)) = s.split_once('/') {
                    if let (Ok(done), Ok(total)) = (done.parse(), total.parse()) {
                        return Ok(ExternalStatus::Progress { done, total });
                    }
                }
                Err(TixError::UnknownExternalStatus(s.to_string()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
