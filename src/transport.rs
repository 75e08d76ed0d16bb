//! Transport abstraction (spec §6) and two implementations: an
//! in-process one for tests, and an HTTP one talking to the broker in
//! `broker.rs`.
//!
//! Both implementations realise the same five operations the core
//! protocol is written against, so `SmcParty` (party.rs) never knows or
//! cares which one it's using. Receives are blocking long-polls with a
//! bounded backoff (spec §4.9, §5): a party that never gets an expected
//! share blocks until the configured timeout, then the run aborts with a
//! `TransportError::Timeout`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::dealer::{BeaverTriple, Dealer};
use crate::error::{MpcError, TransportError};
use crate::expression::ExprId;
use crate::field::DEFAULT_MODULUS;

/// How often a blocking receive re-polls while waiting for a label to
/// appear, and how long it waits in total before giving up.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Enqueues a payload at `destination`'s private mailbox under
    /// `label`. No response.
    async fn send_private(&self, destination: &str, label: &str, bytes: Vec<u8>)
        -> Result<(), MpcError>;

    /// Blocking dequeue of the next payload addressed to this party under
    /// exactly this label.
    async fn retrieve_private(&self, label: &str) -> Result<Vec<u8>, MpcError>;

    /// Writes a payload under this party's own namespace at `label`,
    /// overwriting whatever was there.
    async fn publish(&self, label: &str, bytes: Vec<u8>) -> Result<(), MpcError>;

    /// Polls until `owner` has published something at `label`.
    async fn retrieve_public(&self, owner: &str, label: &str) -> Result<Vec<u8>, MpcError>;

    /// Calls into the dealer and returns this party's triple slice for
    /// `op_id`.
    async fn retrieve_triple_shares(&self, op_id: ExprId) -> Result<BeaverTriple, MpcError>;
}

type Mailbox = HashMap<(String, String), VecDeque<Vec<u8>>>;
type PublicBoard = HashMap<(String, String), Vec<u8>>;

/// Shared state behind an in-process broker: per-destination mailboxes, a
/// public bulletin board, and one dealer. Cloning an `InMemoryBroker` is
/// cheap — every clone refers to the same underlying state.
#[derive(Clone)]
pub struct InMemoryBroker {
    mailboxes: Arc<Mutex<Mailbox>>,
    public_board: Arc<Mutex<PublicBoard>>,
    dealer: Arc<Dealer>,
}

impl InMemoryBroker {
    pub fn new(modulus: i64) -> Self {
        Self {
            mailboxes: Arc::new(Mutex::new(HashMap::new())),
            public_board: Arc::new(Mutex::new(HashMap::new())),
            dealer: Arc::new(Dealer::new(modulus)),
        }
    }

    pub fn register_participant(&self, client_id: &str) {
        self.dealer.register_participant(client_id);
    }

    /// Binds a `Transport` for one party to this shared broker.
    pub fn transport_for(&self, client_id: &str) -> InMemoryTransport {
        InMemoryTransport {
            client_id: client_id.to_string(),
            broker: self.clone(),
            poll_policy: PollPolicy::default(),
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(DEFAULT_MODULUS)
    }
}

/// A `Transport` bound to one party over an in-process broker. Used by
/// the integration tests to run the whole protocol deterministically in a
/// single process (spec §6's "external collaborator" stands in as shared
/// memory instead of sockets).
pub struct InMemoryTransport {
    client_id: String,
    broker: InMemoryBroker,
    poll_policy: PollPolicy,
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send_private(
        &self,
        destination: &str,
        label: &str,
        bytes: Vec<u8>,
    ) -> Result<(), MpcError> {
        let mut mailboxes = self.broker.mailboxes.lock().expect("mailbox mutex poisoned");
        mailboxes
            .entry((destination.to_string(), label.to_string()))
            .or_default()
            .push_back(bytes);
        Ok(())
    }

    async fn retrieve_private(&self, label: &str) -> Result<Vec<u8>, MpcError> {
        let key = (self.client_id.clone(), label.to_string());
        poll_until(self.poll_policy, label, || {
            let mut mailboxes = self.broker.mailboxes.lock().expect("mailbox mutex poisoned");
            mailboxes.get_mut(&key).and_then(|queue| queue.pop_front())
        })
        .await
    }

    async fn publish(&self, label: &str, bytes: Vec<u8>) -> Result<(), MpcError> {
        let mut board = self.broker.public_board.lock().expect("board mutex poisoned");
        board.insert((self.client_id.clone(), label.to_string()), bytes);
        Ok(())
    }

    async fn retrieve_public(&self, owner: &str, label: &str) -> Result<Vec<u8>, MpcError> {
        let key = (owner.to_string(), label.to_string());
        poll_until(self.poll_policy, label, || {
            let board = self.broker.public_board.lock().expect("board mutex poisoned");
            board.get(&key).cloned()
        })
        .await
    }

    async fn retrieve_triple_shares(&self, op_id: ExprId) -> Result<BeaverTriple, MpcError> {
        self.broker.dealer.triple_shares(&self.client_id, op_id)
    }
}

async fn poll_until<F>(policy: PollPolicy, label: &str, mut try_take: F) -> Result<Vec<u8>, MpcError>
where
    F: FnMut() -> Option<Vec<u8>>,
{
    let deadline = tokio::time::Instant::now() + policy.timeout;
    loop {
        if let Some(bytes) = try_take() {
            return Ok(bytes);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(MpcError::Transport(TransportError::Timeout {
                label: label.to_string(),
            }));
        }
        tokio::time::sleep(policy.interval).await;
    }
}

/// An HTTP-backed `Transport` talking to the broker binary in `broker.rs`
/// via `reqwest`. Private sends and public polls ride over the routes the
/// broker exposes; this is the transport the `mpc_client` binary uses.
pub struct HttpTransport {
    client_id: String,
    base_url: String,
    client: reqwest::Client,
    poll_policy: PollPolicy,
}

impl HttpTransport {
    pub fn new(client_id: impl Into<String>, broker_host: &str, broker_port: u16) -> Self {
        Self {
            client_id: client_id.into(),
            base_url: format!("http://{broker_host}:{broker_port}"),
            client: reqwest::Client::new(),
            poll_policy: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    async fn register(&self) -> Result<(), MpcError> {
        self.client
            .post(format!("{}/register/{}", self.base_url, self.client_id))
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_private(
        &self,
        destination: &str,
        label: &str,
        bytes: Vec<u8>,
    ) -> Result<(), MpcError> {
        self.client
            .post(format!("{}/private/{destination}/{label}", self.base_url))
            .body(bytes)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }

    async fn retrieve_private(&self, label: &str) -> Result<Vec<u8>, MpcError> {
        let url = format!("{}/private/{}/{label}", self.base_url, self.client_id);
        self.poll_http(&url, label).await
    }

    async fn publish(&self, label: &str, bytes: Vec<u8>) -> Result<(), MpcError> {
        self.client
            .post(format!("{}/publish/{}/{label}", self.base_url, self.client_id))
            .body(bytes)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }

    async fn retrieve_public(&self, owner: &str, label: &str) -> Result<Vec<u8>, MpcError> {
        let url = format!("{}/public/{owner}/{label}", self.base_url);
        self.poll_http(&url, label).await
    }

    async fn retrieve_triple_shares(&self, op_id: ExprId) -> Result<BeaverTriple, MpcError> {
        self.register().await?;
        let url = format!(
            "{}/triple/{}/{}",
            self.base_url,
            self.client_id,
            op_id.as_label()
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|source| {
            MpcError::Transport(TransportError::MalformedPayload {
                label: format!("triple/{}", op_id.as_label()),
                source,
            })
        })
    }
}

impl HttpTransport {
    async fn poll_http(&self, url: &str, label: &str) -> Result<Vec<u8>, MpcError> {
        let deadline = tokio::time::Instant::now() + self.poll_policy.timeout;
        loop {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            if response.status().is_success() {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
                return Ok(bytes.to_vec());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(MpcError::Transport(TransportError::Timeout {
                    label: label.to_string(),
                }));
            }
            tokio::time::sleep(self.poll_policy.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn private_message_is_delivered_to_the_right_label() {
        let broker = InMemoryBroker::new(DEFAULT_MODULUS);
        let alice = broker.transport_for("alice");
        let bob = broker.transport_for("bob");

        bob.send_private("alice", "greeting", b"hello".to_vec())
            .await
            .unwrap();
        let received = alice.retrieve_private("greeting").await.unwrap();
        assert_eq!(received, b"hello");
    }

    #[tokio::test]
    async fn public_message_is_readable_by_any_party() {
        let broker = InMemoryBroker::new(DEFAULT_MODULUS);
        let leader = broker.transport_for("leader");
        let follower = broker.transport_for("follower");

        leader.publish("Publish_Result", b"42".to_vec()).await.unwrap();
        let received = follower.retrieve_public("leader", "Publish_Result").await.unwrap();
        assert_eq!(received, b"42");
    }

    #[tokio::test]
    async fn retrieve_private_times_out_when_nothing_arrives() {
        let broker = InMemoryBroker::new(DEFAULT_MODULUS);
        let alice = InMemoryTransport {
            client_id: "alice".to_string(),
            broker,
            poll_policy: PollPolicy {
                interval: Duration::from_millis(5),
                timeout: Duration::from_millis(30),
            },
        };
        let result = alice.retrieve_private("never-comes").await;
        assert!(matches!(
            result,
            Err(MpcError::Transport(TransportError::Timeout { .. }))
        ));
    }

    #[tokio::test]
    async fn two_parties_get_consistent_triple_shares() {
        let broker = InMemoryBroker::new(DEFAULT_MODULUS);
        broker.register_participant("alice");
        broker.register_participant("bob");
        let alice = broker.transport_for("alice");
        let bob = broker.transport_for("bob");

        let op_id = ExprId::new();
        let a_triple = alice.retrieve_triple_shares(op_id).await.unwrap();
        let b_triple = bob.retrieve_triple_shares(op_id).await.unwrap();

        use crate::secret_sharing::reconstruct;
        let a = reconstruct(&[a_triple.a, b_triple.a], DEFAULT_MODULUS);
        let b = reconstruct(&[a_triple.b, b_triple.b], DEFAULT_MODULUS);
        let c = reconstruct(&[a_triple.c, b_triple.c], DEFAULT_MODULUS);
        assert_eq!(c, crate::field::field_mul(a, b, DEFAULT_MODULUS));
    }
}
