//! # Operator Payloads as `Any`
//!
//! Every operator payload travels as a protobuf `Any`. The type URL identifies the
//! payload message (`type.googleapis.com/planx.<Message>`) so a worker can check
//! that the body it is about to decode is the one the node type promises.
//!
//! `NodeBody` ties each payload message to its `PlanNodeType` and its URL;
//! `pack` and `unpack` are inverse operations over it.

use crate::proto::*;
use prost::Message;
use prost_types::Any;

/// Prefix of every payload type URL.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/planx.";

/// A payload message of one operator kind.
pub trait NodeBody: Message + Default + Sized {
    /// Node type a node carrying this payload has.
    const NODE_TYPE: PlanNodeType;
    /// Unqualified message name, the last segment of the type URL.
    const MESSAGE_NAME: &'static str;

    fn type_url() -> String {
        format!("{TYPE_URL_PREFIX}{}", Self::MESSAGE_NAME)
    }
}

macro_rules! node_body {
    ($msg:ident, $node_type:ident) => {
        impl NodeBody for $msg {
            const NODE_TYPE: PlanNodeType = PlanNodeType::$node_type;
            const MESSAGE_NAME: &'static str = stringify!($msg);
        }
    };
}

node_body!(InsertNode, Insert);
node_body!(DeleteNode, Delete);
node_body!(SeqScanNode, SeqScan);
node_body!(ValuesNode, Values);
node_body!(FilterNode, Filter);
node_body!(ProjectNode, Project);
node_body!(HashJoinNode, HashJoin);
node_body!(NestedLoopJoinNode, NestedLoopJoin);
node_body!(HashAggNode, HashAgg);
node_body!(SortNode, Sort);
node_body!(LimitNode, Limit);
node_body!(ExchangeNode, Exchange);

/// Pack a payload into an `Any`.
pub fn pack<M: NodeBody>(body: &M) -> Any {
    Any {
        type_url: M::type_url(),
        value: body.encode_to_vec(),
    }
}

/// Unpack an `Any` holding an `M`. Returns `None` if the type URL names another message.
pub fn unpack<M: NodeBody>(any: &Any) -> Option<Result<M, prost::DecodeError>> {
    if any.type_url != M::type_url() {
        return None;
    }
    Some(M::decode(&any.value[..]))
}

/// Build a node with `body` as payload. The node type follows from the payload.
pub fn plan_node<M: NodeBody>(body: &M, children: Vec<PlanNode>) -> PlanNode {
    PlanNode {
        node_type: M::NODE_TYPE as i32,
        body: Some(pack(body)),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_insert_body() {
        let body = InsertNode {
            table_id: 7,
            column_ids: vec![1, 2, 3],
            bound_column_ids: vec![3, 1],
        };

        let any = pack(&body);
        assert_eq!(any.type_url, "type.googleapis.com/planx.InsertNode");

        let decoded: InsertNode = unpack(&any).unwrap().unwrap();
        assert_eq!(decoded, body);
        assert!(unpack::<DeleteNode>(&any).is_none());
    }

    #[test]
    fn test_plan_node_type_follows_body() {
        let node = plan_node(&LimitNode { limit: 5, offset: 0 }, vec![]);
        assert_eq!(node.node_type(), PlanNodeType::Limit);
    }
}
