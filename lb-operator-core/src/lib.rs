pub mod diff;
pub mod events;
pub mod fetcher;
pub mod graphql;
pub mod identifier;
pub mod inventory;
pub mod kubernetes;
pub mod loadbalancer;
pub mod metadata;
pub mod naming;
pub mod relationship;
pub mod status;
