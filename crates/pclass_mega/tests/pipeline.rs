use pclass_core::{
    answer::{generate_answers, generate_traces, AnswerMode},
    dedup::dedup,
    engine::{EngineConfig, EngineKind},
    expand::expand_all_ref,
};
use pclass_io::{parse_rules, parse_traces, MegaFlowFormat, ReadOptions, RuleFormat};
use pclass_mega::megaflow_rules;

const RULES: &str = "\
@10.0.0.0/8\t0.0.0.0/0\t0 : 65535\t80 : 80\t0x06/0xFF\t0x0000/0x0000\t0
@10.1.0.0/16\t192.168.0.0/16\t1024 : 2047\t0 : 65535\t0x00/0x00\t0x0000/0x0000\t0
@0.0.0.0/0\t0.0.0.0/0\t0 : 65535\t0 : 65535\t0x00/0x00\t0x0000/0x0000\t0
";

// 10.1.2.3 -> 192.168.1.1 1500 -> 80, 10.2.0.1 -> 8.8.8.8 5000 -> 80, 11.0.0.1 -> 8.8.8.8 1 -> 1
const TRACES: &str = "\
167838211\t3232235777\t1500\t80\t6\t0\t0
167903233\t134744072\t5000\t80\t6\t0\t0
184549377\t134744072\t1\t1\t17\t0\t0
167838211\t3232235777\t1500\t80\t6\t0\t0
";

#[test]
fn test_megaflow_from_text() {
    let set = parse_rules(RULES, &ReadOptions::default()).unwrap();
    assert_eq!(set.rules.len(), 3);
    let rules = dedup(expand_all_ref(&set.rules));
    let traces = parse_traces(TRACES).traces;
    assert_eq!(traces.len(), 4);

    let report = megaflow_rules(&rules, &traces).unwrap();
    let mut out = vec![];
    MegaFlowFormat
        .write_rules(&mut out, &report.rules, false)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "@10.1.0.0/16\t192.168.0.0/16\t0x0400/6\t0x0050/16\t\n\
         @10.0.0.0/8\t0.0.0.0/0\t0x0000/0\t0x0050/16\t\n\
         @0.0.0.0/0\t0.0.0.0/0\t0x0000/0\t0x0000/0\t\n"
    );
    // the /8 rule covers the /16 one, the wildcard covers both
    let pairs: Vec<(usize, usize)> = report
        .containments
        .iter()
        .map(|c| (c.outer, c.inner))
        .collect();
    assert_eq!(pairs, vec![(1, 0), (2, 0), (2, 1)]);
}

#[test]
fn test_answers_from_text() {
    let rules = parse_rules(RULES, &ReadOptions::default()).unwrap().rules;
    let traces = parse_traces(TRACES).traces;
    for kind in [EngineKind::Linear, EngineKind::TupleSpace] {
        let config = EngineConfig {
            kind,
            ..Default::default()
        };
        assert_eq!(
            generate_answers(&rules, &traces, &config, AnswerMode::Full),
            vec![3, 3, 1, 3]
        );
        // the first rule is gone, 10.1.2.3 now falls to the /16 rule
        assert_eq!(
            generate_answers(&rules, &traces, &config, AnswerMode::DeleteQuarter),
            vec![2, 1, 1, 2]
        );
        let generated = generate_traces(&rules);
        assert_eq!(
            generate_answers(&rules, &generated, &config, AnswerMode::Full),
            vec![3, 2, 1]
        );
    }
}
