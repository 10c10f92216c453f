//! End-to-end lottery rounds over the local router.

use std::time::Duration;

use treelot_lottery::{CandidateDraw, DrawSource, LotteryFactory, RandomDraw};
use treelot_network::*;
use treelot_protocol::*;

const TIMEOUT: Duration = Duration::from_secs(5);

fn local(draws: DrawSource) -> LocalTest {
    LocalTest::new().with_factory(LotteryFactory::new(draws))
}

async fn run_round(tree: &Tree, draws: DrawSource) -> (LotteryTicket, MessageCounts, Vec<NodeReport>) {
    let mut round = local(draws).start_protocol(PROTOCOL_NAME, tree).unwrap();
    let ticket = round.ticket(TIMEOUT).await.unwrap();
    let counts = round.message_counts();
    (ticket, counts, round.finish().await)
}

fn assert_every_node_done_once(tree: &Tree, reports: &[NodeReport]) {
    assert_eq!(reports.len(), tree.len());
    for report in reports {
        assert_eq!(report.state, NodeState::Done, "node {} not done", report.id);
        let node = tree.node(report.id).unwrap();
        if node.is_root() {
            assert_eq!(report.tickets_published, 1);
            assert_eq!(report.replies_sent, 0);
        } else {
            assert_eq!(report.tickets_published, 0);
            assert_eq!(report.replies_sent, 1);
        }
        assert_eq!(report.replies_received, node.children().len());
    }
}

#[tokio::test]
async fn test_single_node_round() {
    let tree = Tree::generate(1, 2).unwrap();
    let mut round = local(DrawSource::default()).start_protocol(PROTOCOL_NAME, &tree).unwrap();

    let ticket = round.ticket(TIMEOUT).await.unwrap();
    assert_eq!(ticket.owner_id, NodeId(0));
    assert!(CANDIDATE_RANGE.contains(&ticket.number));
    assert_eq!(round.message_counts().total_sent(), 0, "no network message for a lone root");

    let reports = round.finish().await;
    assert_every_node_done_once(&tree, &reports);
}

#[tokio::test]
async fn test_two_node_round() {
    let tree = Tree::generate(2, 2).unwrap();
    let mut round = local(DrawSource::Random { seed: Some(11) })
        .start_protocol(PROTOCOL_NAME, &tree)
        .unwrap();

    let ticket = round.ticket(TIMEOUT).await.unwrap();
    let counts = round.message_counts();
    assert_eq!(counts.announces, 1);
    assert_eq!(counts.replies, 1);

    let reports = round.finish().await;
    assert_every_node_done_once(&tree, &reports);
    assert_eq!(reports[0].replies_received, 1);

    // Seeded draws are `seed + node`; recompute both and expect the larger,
    // the root keeping ties.
    let root = RandomDraw::seeded(11).draw(NodeId(0));
    let child = RandomDraw::seeded(12).draw(NodeId(1));
    let expected = if child > root {
        LotteryTicket::new(child, NodeId(1))
    } else {
        LotteryTicket::new(root, NodeId(0))
    };
    assert_eq!(ticket, expected);
    assert_eq!(reports[1].best, Some(Reply::new(child, NodeId(1))));
    assert_eq!(reports[0].best.map(LotteryTicket::from), Some(expected));
}

#[tokio::test]
async fn test_two_node_round_counts_root_draw() {
    for seed in 0..50 {
        let tree = Tree::generate(2, 1).unwrap();
        let (ticket, _, _) = run_round(&tree, DrawSource::Random { seed: Some(seed) }).await;
        let root = RandomDraw::seeded(seed).draw(NodeId(0));
        let child = RandomDraw::seeded(seed + 1).draw(NodeId(1));
        let expected = if child > root {
            LotteryTicket::new(child, NodeId(1))
        } else {
            LotteryTicket::new(root, NodeId(0))
        };
        assert_eq!(ticket, expected, "seed {seed}");
    }
}

#[tokio::test]
async fn test_thirteen_node_round() {
    let tree = Tree::generate(13, 2).unwrap();
    let mut round = local(DrawSource::default()).start_protocol(PROTOCOL_NAME, &tree).unwrap();

    let ticket = round.ticket(TIMEOUT).await.unwrap();
    assert!((ticket.owner_id.index()) < tree.len());

    let counts = round.message_counts();
    assert_eq!(counts.announces, 12);
    assert_eq!(counts.replies, 12);
    assert_eq!(counts.dropped, 0);

    let reports = round.finish().await;
    assert_every_node_done_once(&tree, &reports);
    assert_eq!(reports[0].best.map(LotteryTicket::from), Some(ticket));
}

#[tokio::test]
async fn test_fixed_draws_pick_strict_maximum() {
    let tree = Tree::generate(13, 3).unwrap();
    let values: Vec<(u32, u32)> = (0..13).map(|i| (i, (i * 7) % 13 + 20)).collect();
    let winner = values.iter().max_by_key(|(_, v)| *v).unwrap();

    let (ticket, counts, reports) = run_round(&tree, DrawSource::fixed(values.clone())).await;
    assert_eq!(ticket, LotteryTicket::new(winner.1, NodeId(winner.0)));
    assert_eq!(counts.replies, 12);
    assert_every_node_done_once(&tree, &reports);
}

#[tokio::test]
async fn test_tie_with_root_keeps_root() {
    let tree = Tree::generate(3, 2).unwrap();
    let (ticket, _, _) = run_round(&tree, DrawSource::fixed([(0, 60), (1, 60), (2, 10)])).await;
    assert_eq!(ticket, LotteryTicket::new(60, NodeId(0)));
}

#[tokio::test]
async fn test_tie_between_children_keeps_first_child() {
    let tree = Tree::generate(3, 2).unwrap();
    let (ticket, _, _) = run_round(&tree, DrawSource::fixed([(0, 5), (1, 80), (2, 80)])).await;
    assert_eq!(ticket, LotteryTicket::new(80, NodeId(1)));
}

#[tokio::test]
async fn test_tie_inside_subtree_keeps_internal_node() {
    // 0 -> 1 -> 2: node 1 holds 9 before its child's 9 arrives.
    let tree = Tree::from_parents(&[None, Some(0), Some(1)]).unwrap();
    let (ticket, _, reports) = run_round(&tree, DrawSource::fixed([(0, 5), (1, 9), (2, 9)])).await;
    assert_eq!(ticket, LotteryTicket::new(9, NodeId(1)));
    assert_eq!(reports[1].best, Some(Reply::new(9, NodeId(1))));
}

#[tokio::test]
async fn test_deep_leaf_wins() {
    let tree = Tree::generate(8, 1).unwrap();
    let values: Vec<(u32, u32)> = (0..8).map(|i| (i, if i == 7 { 99 } else { i })).collect();
    let (ticket, _, reports) = run_round(&tree, DrawSource::fixed(values)).await;
    assert_eq!(ticket, LotteryTicket::new(99, NodeId(7)));
    // Every ancestor forwarded the deep leaf's value.
    for report in &reports {
        assert_eq!(report.best.unwrap().owner_id, NodeId(7));
    }
}

#[tokio::test]
async fn test_ticket_read_once() {
    let tree = Tree::generate(4, 2).unwrap();
    let mut round = local(DrawSource::default()).start_protocol(PROTOCOL_NAME, &tree).unwrap();
    round.ticket(TIMEOUT).await.unwrap();
    assert!(matches!(round.ticket(TIMEOUT).await, Err(NetworkError::TicketTaken)));
}

#[tokio::test]
async fn test_unknown_protocol_rejected() {
    let tree = Tree::generate(2, 2).unwrap();
    let err = local(DrawSource::default()).start_protocol("Clock", &tree).unwrap_err();
    assert!(matches!(err, NetworkError::UnknownProtocol(name) if name == "Clock"));

    let err = LocalTest::new().start_protocol(PROTOCOL_NAME, &tree).unwrap_err();
    assert!(matches!(err, NetworkError::UnknownProtocol(_)));
}

#[tokio::test]
async fn test_setup_error_surfaces_before_start() {
    let tree = Tree::generate(3, 2).unwrap();
    // Node 2 has no injected draw.
    let err = local(DrawSource::fixed([(0, 1), (1, 2)]))
        .start_protocol(PROTOCOL_NAME, &tree)
        .unwrap_err();
    assert!(matches!(err, NetworkError::Setup(_)));
}

#[tokio::test]
async fn test_rounds_are_independent() {
    let tree = Tree::generate(5, 2).unwrap();
    let test = local(DrawSource::fixed((0..5).map(|i| (i, 10 + i))));

    let mut first = test.start_protocol(PROTOCOL_NAME, &tree).unwrap();
    let mut second = test.start_protocol(PROTOCOL_NAME, &tree).unwrap();
    assert_ne!(first.round_id(), second.round_id());

    let a = first.ticket(TIMEOUT).await.unwrap();
    let b = second.ticket(TIMEOUT).await.unwrap();
    assert_eq!(a, LotteryTicket::new(14, NodeId(4)));
    assert_eq!(a, b);
}
