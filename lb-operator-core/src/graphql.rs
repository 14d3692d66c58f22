use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphQlError {
    #[error("Couldn't reach the GraphQL endpoint! Reason: {}", .0)]
    Transport(reqwest::Error),
    #[error("GraphQL endpoint responded with {}!", .0)]
    Status(reqwest::StatusCode),
    #[error("GraphQL query failed! Reason: {}", .0)]
    Query(String),
    #[error("GraphQL response is missing data!")]
    MissingData,
}

impl GraphQlError {
    pub fn is_not_found(&self) -> bool {
        match self {
            GraphQlError::Query(message) => message.to_lowercase().contains("not found"),
            _ => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct Request<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Debug, Deserialize)]
struct Response<D> {
    data: Option<D>,
    #[serde(default)]
    errors: Vec<ResponseError>,
}

#[derive(Debug, Deserialize)]
struct ResponseError {
    message: String,
}

/// Relay style connection, `{ edges: [{ node: ... }] }`.
#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Connection<T> {
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|edge| edge.node).collect()
    }
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

pub async fn execute<V, D>(
    client: &reqwest::Client,
    endpoint: &str,
    query: &str,
    variables: V,
) -> Result<D, GraphQlError>
where
    V: Serialize,
    D: DeserializeOwned,
{
    let response = client
        .post(endpoint)
        .json(&Request { query, variables })
        .send()
        .await
        .map_err(GraphQlError::Transport)?;

    let status = response.status();
    if !status.is_success() {
        debug!("GraphQL request to {endpoint} failed with {status}");
        return Err(GraphQlError::Status(status));
    }

    let response: Response<D> = response.json().await.map_err(GraphQlError::Transport)?;

    if !response.errors.is_empty() {
        return Err(GraphQlError::Query(
            response
                .errors
                .into_iter()
                .map(|error| error.message)
                .collect::<Vec<String>>()
                .join("; "),
        ));
    }

    response.data.ok_or(GraphQlError::MissingData)
}
