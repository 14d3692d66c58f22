use crate::identifier::PrefixedId;

/// How an event subject relates to a load balancer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadBalancerRelationship {
    #[default]
    None,
    /// the subject itself is a load balancer
    Direct,
    /// the subject is associated with a load balancer
    Associated,
}

/// Figures out which load balancer (if any) the subject is about.
///
/// A subject carrying the load balancer prefix wins over its associations.
/// When several associated identifiers are load balancers the first one
/// in iteration order is picked.
pub fn classify<'a>(
    subject: &'a PrefixedId,
    associated: impl IntoIterator<Item = &'a PrefixedId>,
) -> (LoadBalancerRelationship, Option<&'a PrefixedId>) {
    if subject.is_load_balancer() {
        return (LoadBalancerRelationship::Direct, Some(subject));
    }

    match associated.into_iter().find(|id| id.is_load_balancer()) {
        Some(id) => (LoadBalancerRelationship::Associated, Some(id)),
        None => (LoadBalancerRelationship::None, None),
    }
}
