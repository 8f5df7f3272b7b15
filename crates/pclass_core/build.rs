use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// (name, bit width), in rule dimension order
const DIMENSIONS: [(&str, u32); 5] = [
    ("sip", 32),
    ("dip", 32),
    ("sport", 16),
    ("dport", 16),
    ("proto", 8),
];

fn main() {
    let path = Path::new(&env::var("OUT_DIR").unwrap()).join("codegen.rs");
    let mut file = BufWriter::new(File::create(&path).unwrap());
    let mut m: phf_codegen::OrderedMap<&'static str> = phf_codegen::OrderedMap::new();
    for (index, (name, width)) in DIMENSIONS.iter().enumerate() {
        m.entry(*name, format!("({}usize, {}u32)", index, width).as_str());
    }

    write!(
        &mut file,
        "pub static DIMENSION_MAP: phf::OrderedMap<&'static str, (usize, u32)> = {}",
        m.build()
    )
    .unwrap();
    writeln!(&mut file, ";\n").unwrap();
    writeln!(&mut file, "pub const DIM_NUM: usize = {}usize;\n", DIMENSIONS.len()).unwrap();
}
