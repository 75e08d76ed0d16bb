//! End-to-end protocol runs (spec §8), driven over the in-memory broker
//! so every party's asynchronous task really does race against the
//! others exactly as it would over HTTP, just without sockets.

use std::collections::HashMap;

use mpc_api::{Expression, ProtocolSpec, SmcParty, ValueDict};
use mpc_api::transport::InMemoryBroker;

const P: i64 = 2003;

fn values(pairs: &[(&Expression, i64)]) -> ValueDict {
    pairs.iter().map(|(e, v)| (e.id(), *v)).collect()
}

/// Runs `spec` with one party per `(client_id, own_values)` pair and
/// returns every party's reconstructed result, in the same order the
/// pairs were given.
async fn run_all(spec: ProtocolSpec, owners: Vec<(&str, ValueDict)>) -> Vec<i64> {
    let broker = InMemoryBroker::new(P);
    for (client_id, _) in &owners {
        broker.register_participant(client_id);
    }

    let mut handles = Vec::new();
    for (client_id, own_values) in owners {
        let spec = spec.clone();
        let transport = broker.transport_for(client_id);
        let party = SmcParty::new(client_id, transport).with_modulus(P);
        handles.push(tokio::spawn(async move { party.run(&spec, &own_values).await.unwrap() }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test]
async fn scenario_1_sum_of_two_secrets_plus_a_constant() {
    // f(a,b) = a + b + 10, a=3000, b=5000 -> (3000+5000+10) mod 2003 = 1004
    let a = Expression::secret();
    let b = Expression::secret();
    let expr = a.clone().add(b.clone()).add(Expression::scalar(10));
    let spec = ProtocolSpec::new(expr, vec!["alice".into(), "bob".into()]);

    let results = run_all(
        spec,
        vec![
            ("alice", values(&[(&a, 3000)])),
            ("bob", values(&[(&b, 5000)])),
        ],
    )
    .await;

    assert_eq!(results, vec![1004, 1004]);
}

#[tokio::test]
async fn scenario_2_scaled_difference() {
    // f(a,b) = 2*a - b, a=14, b=3 -> 25
    let a = Expression::secret();
    let b = Expression::secret();
    let expr = Expression::scalar(2).mul(a.clone()).sub(b.clone());
    let spec = ProtocolSpec::new(expr, vec!["alice".into(), "bob".into()]);

    let results = run_all(
        spec,
        vec![
            ("alice", values(&[(&a, 14)])),
            ("bob", values(&[(&b, 3)])),
        ],
    )
    .await;

    assert_eq!(results, vec![25, 25]);
}

#[tokio::test]
async fn scenario_3_linear_combination_of_three_secrets() {
    // f(a,b,c) = 2a + 3b + 5c, a=3,b=14,c=2 -> 58
    let a = Expression::secret();
    let b = Expression::secret();
    let c = Expression::secret();
    let expr = Expression::scalar(2)
        .mul(a.clone())
        .add(Expression::scalar(3).mul(b.clone()))
        .add(Expression::scalar(5).mul(c.clone()));
    let spec = ProtocolSpec::new(expr, vec!["alice".into(), "bob".into(), "carol".into()]);

    let results = run_all(
        spec,
        vec![
            ("alice", values(&[(&a, 3)])),
            ("bob", values(&[(&b, 14)])),
            ("carol", values(&[(&c, 2)])),
        ],
    )
    .await;

    assert_eq!(results, vec![58, 58, 58]);
}

#[tokio::test]
async fn scenario_4_single_secret_by_secret_multiplication() {
    // f(a,b) = a*b, a=5, b=6 -> 30
    let a = Expression::secret();
    let b = Expression::secret();
    let expr = a.clone().mul(b.clone());
    let spec = ProtocolSpec::new(expr, vec!["alice".into(), "bob".into()]);

    let results = run_all(
        spec,
        vec![
            ("alice", values(&[(&a, 5)])),
            ("bob", values(&[(&b, 6)])),
        ],
    )
    .await;

    assert_eq!(results, vec![30, 30]);
}

#[tokio::test]
async fn scenario_5_sum_of_two_products() {
    // f(a,b,c,d) = a*b + c*d, a=5,b=6,c=2,d=3 -> 36
    let a = Expression::secret();
    let b = Expression::secret();
    let c = Expression::secret();
    let d = Expression::secret();
    let expr = a.clone().mul(b.clone()).add(c.clone().mul(d.clone()));
    let spec = ProtocolSpec::new(
        expr,
        vec!["alice".into(), "bob".into(), "carol".into(), "dave".into()],
    );

    let results = run_all(
        spec,
        vec![
            ("alice", values(&[(&a, 5)])),
            ("bob", values(&[(&b, 6)])),
            ("carol", values(&[(&c, 2)])),
            ("dave", values(&[(&d, 3)])),
        ],
    )
    .await;

    assert_eq!(results, vec![36, 36, 36, 36]);
}

#[tokio::test]
async fn scenario_6_deeply_nested_mixed_expression() {
    // f(a,b,c,d) = (a*b + c + 2d)*(c*a*3 - 4 - b) + 5 - a*b*c*d
    // a=10,b=20,c=30,d=40 -> 1520 mod 2003
    let a = Expression::secret();
    let b = Expression::secret();
    let c = Expression::secret();
    let d = Expression::secret();

    let left = a
        .clone()
        .mul(b.clone())
        .add(c.clone())
        .add(Expression::scalar(2).mul(d.clone()));
    let right = c
        .clone()
        .mul(a.clone())
        .mul(Expression::scalar(3))
        .sub(Expression::scalar(4))
        .sub(b.clone());
    let expr = left
        .mul(right)
        .add(Expression::scalar(5))
        .sub(a.clone().mul(b.clone()).mul(c.clone()).mul(d.clone()));

    let spec = ProtocolSpec::new(
        expr,
        vec!["alice".into(), "bob".into(), "carol".into(), "dave".into()],
    );

    let results = run_all(
        spec,
        vec![
            ("alice", values(&[(&a, 10)])),
            ("bob", values(&[(&b, 20)])),
            ("carol", values(&[(&c, 30)])),
            ("dave", values(&[(&d, 40)])),
        ],
    )
    .await;

    assert_eq!(results, vec![1520, 1520, 1520, 1520]);
}

#[tokio::test]
async fn scalar_only_expression_skips_reconstruction_entirely() {
    let expr = Expression::scalar(3).add(Expression::scalar(4));
    let spec = ProtocolSpec::new(expr, vec!["alice".into(), "bob".into()]);

    let results = run_all(
        spec,
        vec![
            ("alice", HashMap::new()),
            ("bob", HashMap::new()),
        ],
    )
    .await;

    assert_eq!(results, vec![7, 7]);
}

#[tokio::test]
async fn single_secret_expression_reconstructs_exactly() {
    let a = Expression::secret();
    let spec = ProtocolSpec::new(a.clone(), vec!["alice".into(), "bob".into(), "carol".into()]);

    let results = run_all(
        spec,
        vec![
            ("alice", values(&[(&a, 777)])),
            ("bob", HashMap::new()),
            ("carol", HashMap::new()),
        ],
    )
    .await;

    assert_eq!(results, vec![777, 777, 777]);
}

#[tokio::test]
async fn input_at_or_above_the_modulus_is_reduced_at_the_boundary() {
    // a = 2003 + 1000, should behave as if a = 1000.
    let a = Expression::secret();
    let spec = ProtocolSpec::new(a.clone(), vec!["alice".into(), "bob".into()]);

    let results = run_all(
        spec,
        vec![
            ("alice", values(&[(&a, 2003 + 1000)])),
            ("bob", HashMap::new()),
        ],
    )
    .await;

    assert_eq!(results, vec![1000, 1000]);
}

#[tokio::test]
async fn single_party_run_needs_no_network_round_at_all() {
    // With one participant a party is its own leader and its own peer;
    // the multiplication sub-protocol still runs but every message is a
    // self-send/self-receive over the same in-memory broker.
    let a = Expression::secret();
    let b = Expression::secret();
    let expr = a.clone().mul(b.clone());
    let spec = ProtocolSpec::new(expr, vec!["solo".into()]);

    let results = run_all(spec, vec![("solo", values(&[(&a, 9), (&b, 7)]))]).await;
    assert_eq!(results, vec![63]);
}
