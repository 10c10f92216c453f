use treelot_protocol::*;

struct Position {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TreePosition for Position {
    fn id(&self) -> NodeId { self.id }
    fn parent(&self) -> Option<NodeId> { self.parent }
    fn children(&self) -> &[NodeId] { &self.children }
}

#[test]
fn test_announce_wire_shape() {
    let msg = Message::Announce(Announce::new(ANNOUNCE_GREETING));
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["announce"]["message"].as_str().unwrap(), ANNOUNCE_GREETING);
}

#[test]
fn test_reply_wire_shape() {
    let msg = Message::Reply(Reply::new(42, NodeId(3)));
    let json = serde_json::to_string(&msg).unwrap();
    assert_eq!(json, r#"{"reply":{"number":42,"owner_id":3}}"#);

    let back: Message = serde_json::from_str(&json).unwrap();
    assert_eq!(back.kind(), MessageKind::Reply);
}

#[test]
fn test_unknown_kind_rejected() {
    let res: Result<Message, _> = serde_json::from_str(r#"{"vote":{"number":1}}"#);
    assert!(res.is_err());
}

#[test]
fn test_kind_slots_are_distinct() {
    let slots: Vec<usize> = MessageKind::ALL.iter().map(|k| k.index()).collect();
    assert_eq!(slots, vec![0, 1]);
}

#[test]
fn test_ticket_from_reply() {
    let ticket: LotteryTicket = Reply::new(99, NodeId(12)).into();
    assert_eq!(ticket, LotteryTicket::new(99, NodeId(12)));
}

#[test]
fn test_roles_from_position() {
    let lonely_root = Position { id: NodeId(0), parent: None, children: vec![] };
    assert_eq!(lonely_root.role(), NodeRole::Root);
    assert!(lonely_root.is_leaf());

    let internal = Position { id: NodeId(1), parent: Some(NodeId(0)), children: vec![NodeId(3)] };
    assert_eq!(internal.role(), NodeRole::Internal);

    let leaf = Position { id: NodeId(3), parent: Some(NodeId(1)), children: vec![] };
    assert_eq!(leaf.role(), NodeRole::Leaf);
    assert!(!leaf.is_root());
}

#[test]
fn test_candidate_range() {
    assert_eq!(CANDIDATE_RANGE.start, 0);
    assert_eq!(CANDIDATE_RANGE.end, 100);
}
