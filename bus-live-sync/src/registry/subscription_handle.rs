//! Opaque token that reverses exactly one `subscribe` call.

use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Returned by [`LiveSync::subscribe`](crate::LiveSync::subscribe) and consumed by
/// [`LiveSync::unsubscribe`](crate::LiveSync::unsubscribe).
///
/// Only the registry mints handles. Each one carries a random identifier, so two
/// subscriptions with identical listeners are still removed independently.
/// Cloning a handle yields another reference to the same subscription.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionHandle {
    route_id: String,
    id: Uuid,
}

impl SubscriptionHandle {
    pub(crate) fn mint(route_id: &str) -> Self {
        Self {
            route_id: route_id.to_string(),
            id: Uuid::new_v4(),
        }
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }
}

impl Display for SubscriptionHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.route_id, self.id.hyphenated())
    }
}
