
use proptest::prelude::*;
use ruletree::{
    combine, combine_nodes, evaluate, parse, parse_with, validate, validate_node, Branch,
    LeafMode, Node, ParseOptions, ValidationMode,
};
use strategies::{arb_node, arb_op, arb_record, arb_rule_list, arb_rule_source};

// ---------------------------------------------------------------------------
// Invariant 1: Serialization round-trip
//
// Encoding a tree and decoding it again yields the identical tree.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn json_round_trip(node in arb_node(4)) {
        let json = node.to_json().unwrap();
        prop_assert_eq!(Node::from_json(&json).unwrap(), node);
    }

    #[test]
    fn parse_then_json_round_trip(node in arb_node(4)) {
        let parsed = parse(&node.to_string()).unwrap();
        let decoded = Node::from_json(&parsed.to_json().unwrap()).unwrap();
        prop_assert_eq!(decoded, parsed);
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Display reparses to the same tree
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn display_reparses(node in arb_node(4)) {
        let source = node.to_string();
        let reparsed = parse(&source);
        prop_assert_eq!(reparsed.as_ref(), Ok(&node), "source: {}", source);
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Combination is a left fold
//
// combine([r1..rn], op) == ((r1 op r2) op r3) ..., and evaluates the same as
// folding the individual results in order.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn combine_is_left_fold(nodes in arb_rule_list(), op in arb_op()) {
        let sources: Vec<String> = nodes.iter().map(ToString::to_string).collect();
        let combined = combine(&sources, op).unwrap();

        let mut iter = nodes.iter().cloned();
        let first = iter.next().unwrap();
        let expected = iter.fold(first, |acc, n| Node::operator(op, acc, n));
        prop_assert_eq!(&combined, &expected);
        prop_assert_eq!(combine_nodes(nodes.clone(), op).unwrap(), expected);
    }

    #[test]
    fn combine_evaluates_as_fold(
        nodes in arb_rule_list(),
        op in arb_op(),
        record in arb_record()
    ) {
        let combined = combine_nodes(nodes.clone(), op).unwrap();
        let results: Vec<bool> = nodes
            .iter()
            .map(|n| evaluate(n, &record).unwrap())
            .collect();
        let expected = results[1..]
            .iter()
            .fold(results[0], |acc, r| match op {
                ruletree::BoolOp::And => acc && *r,
                ruletree::BoolOp::Or => acc || *r,
            });
        prop_assert_eq!(evaluate(&combined, &record).unwrap(), expected);
    }

    #[test]
    fn combined_right_child_is_newest(nodes in arb_rule_list(), op in arb_op()) {
        prop_assume!(nodes.len() >= 2);
        let last = nodes[nodes.len() - 1].clone();
        let combined = combine_nodes(nodes, op).unwrap();
        prop_assert_eq!(combined.op(), Some(op));
        prop_assert_eq!(combined.child(Branch::Right), Some(&last));
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: Validation modes
//
// Every structurally valid rule passes the substring gate too.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn fragment_mode_passes_structural_validation((_node, source) in arb_rule_source(3)) {
        let options = ParseOptions::default().with_leaf_mode(LeafMode::Fragment);
        let fragments = parse_with(&source, &options).unwrap();
        prop_assert_eq!(validate_node(&fragments), Ok(()), "source: {}", source);
    }

    #[test]
    fn structural_implies_substring(node in arb_node(3)) {
        let source = node.to_string();
        prop_assert!(validate_node(&node).is_ok());
        prop_assert!(validate(&source, ValidationMode::Structural).is_ok());
        prop_assert!(validate(&source, ValidationMode::Substring).is_ok());
    }
}

// ---------------------------------------------------------------------------
// Invariant 5: Both leaf representations agree
//
// Parsing in fragment mode and interpreting the fragments gives the same
// answer as structured evaluation.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn fragment_mode_agrees_with_structured(
        (node, source) in arb_rule_source(3),
        record in arb_record()
    ) {
        let parsed = parse(&source);
        prop_assert_eq!(parsed.as_ref(), Ok(&node), "source: {}", source);
        let options = ParseOptions::default().with_leaf_mode(LeafMode::Fragment);
        let fragments = parse_with(&source, &options).unwrap();
        prop_assert!(fragments.leaves().iter().all(|l| matches!(l, Node::Operand(_))));
        prop_assert_eq!(
            evaluate(&fragments, &record),
            evaluate(&node, &record),
            "source: {}", source
        );
    }
}

// ---------------------------------------------------------------------------
// Invariant 6: Mutation never changes shape
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn set_operator_keeps_leaves(node in arb_node(3), op in arb_op()) {
        let mut mutated = node.clone();
        match mutated.set_operator(op) {
            Ok(()) => {
                prop_assert_eq!(mutated.op(), Some(op));
                prop_assert_eq!(mutated.leaves(), node.leaves());
                prop_assert_eq!(mutated.depth(), node.depth());
            }
            Err(_) => {
                prop_assert!(node.is_leaf());
                prop_assert_eq!(mutated, node);
            }
        }
    }
}
