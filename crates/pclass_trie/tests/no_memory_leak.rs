use peak_alloc::PeakAlloc;
use pclass_trie::PrefixTrie;

#[test]
#[ignore = "test should be run mannually"]
fn test_no_memory_leak() {
    #[global_allocator]
    static PEAK_ALLOC: PeakAlloc = PeakAlloc;

    let mut trie = PrefixTrie::new(32);

    let mut prefixes = vec![];
    for i in 0..u16::MAX as u32 {
        let len = 32 - (i % 25);
        prefixes.push((i.wrapping_mul(0x9e37_79b9), len));
    }
    let current_mem = PEAK_ALLOC.current_usage_as_kb();
    println!("This program initially uses {} kB of RAM.", current_mem);

    for round in ["first", "second", "third"] {
        for (i, (key, len)) in prefixes.iter().enumerate() {
            trie.insert(*key, *len, i as u32 + 1).unwrap();
        }
        let current_mem = PEAK_ALLOC.current_usage_as_kb();
        println!(
            "{round} time: after insertion of {} nodes: it uses {} kB of RAM.",
            trie.node_count(),
            current_mem
        );

        trie.clear();
        let current_mem = PEAK_ALLOC.current_usage_as_kb();
        println!(
            "{round} time: after deletion at once: it uses {} kB of RAM.",
            current_mem
        );
        assert_eq!(trie.node_count(), 1);
    }
}
