use std::{
    fs::File,
    io::{self, BufWriter, Write},
    net::Ipv4Addr,
    path::Path,
};

use tracing::info;

use pclass_core::rule::{family::Dimension, Rule};

use crate::error::IoError;

/// [RuleFormat] renders a rule as one line of a rule file.
pub trait RuleFormat {
    // Required method

    /// Write the fields of `rule`, each followed by a tab, without priority and line end.
    fn _write_rule<W: Write>(&self, w: &mut W, rule: &Rule) -> io::Result<()>;

    // Provided method
    fn write_rules<W: Write>(
        &self,
        w: &mut W,
        rules: &[Rule],
        with_priority: bool,
    ) -> io::Result<()> {
        for rule in rules {
            self._write_rule(w, rule)?;
            if with_priority {
                write!(w, "{}\t", rule.priority)?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

fn write_ips<W: Write>(w: &mut W, rule: &Rule) -> io::Result<()> {
    write!(w, "@")?;
    for d in [Dimension::SrcIp, Dimension::DstIp] {
        write!(
            w,
            "{}/{}\t",
            Ipv4Addr::from(rule.range[d.index()].low),
            rule.prefix_len[d.index()]
        )?;
    }
    Ok(())
}

fn write_port_prefixes<W: Write>(w: &mut W, rule: &Rule) -> io::Result<()> {
    for d in [Dimension::SrcPort, Dimension::DstPort] {
        write!(
            w,
            "0x{:04x}/{}\t",
            rule.range[d.index()].low,
            rule.prefix_len[d.index()]
        )?;
    }
    Ok(())
}

/// The rule file format read back by [parse_rules](crate::parse_rules): port ranges as
/// `lo : hi`, the protocol either exact or wildcard.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFormat;

impl RuleFormat for PlainFormat {
    fn _write_rule<W: Write>(&self, w: &mut W, rule: &Rule) -> io::Result<()> {
        write_ips(w, rule)?;
        for d in [Dimension::SrcPort, Dimension::DstPort] {
            let r = rule.range[d.index()];
            write!(w, "{} : {}\t", r.low, r.high)?;
        }
        let proto = rule.range[Dimension::Proto.index()];
        if proto.is_single() {
            write!(w, "0x{:02x}/0xFF\t", proto.low)?;
        } else {
            write!(w, "0x{:02x}/0x00\t", proto.low)?;
        }
        write!(w, "0x0000/0x0000\t")
    }
}

/// Every dimension as `value/prefix_len`, for expanded rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixFormat;

impl RuleFormat for PrefixFormat {
    fn _write_rule<W: Write>(&self, w: &mut W, rule: &Rule) -> io::Result<()> {
        write_ips(w, rule)?;
        write_port_prefixes(w, rule)?;
        let p = Dimension::Proto.index();
        write!(w, "0x{:02x}/{}\t", rule.range[p].low, rule.prefix_len[p])
    }
}

/// IPs and ports as `value/prefix_len`, no protocol column.
#[derive(Debug, Default, Clone, Copy)]
pub struct MegaFlowFormat;

impl RuleFormat for MegaFlowFormat {
    fn _write_rule<W: Write>(&self, w: &mut W, rule: &Rule) -> io::Result<()> {
        write_ips(w, rule)?;
        write_port_prefixes(w, rule)
    }
}

/// Probe packets for the exhaustive MegaFlow rule set: every field starts all ones and is
/// halved down to 1, sip outermost. One `0x%08x 0x%08x 0x%04x 0x%04x` line per packet.
pub fn write_megaflow_packets<W: Write>(w: &mut W) -> io::Result<usize> {
    fn halvings(start: u32) -> impl Iterator<Item = u32> {
        std::iter::successors(Some(start), |v| Some(v >> 1).filter(|v| *v > 0))
    }
    let mut n = 0;
    for sip in halvings(u32::MAX) {
        for dip in halvings(u32::MAX) {
            for sport in halvings(0xffff) {
                for dport in halvings(0xffff) {
                    writeln!(w, "0x{:08x} 0x{:08x} 0x{:04x} 0x{:04x}", sip, dip, sport, dport)?;
                    n += 1;
                }
            }
        }
    }
    Ok(n)
}

pub fn save_megaflow_packets(path: impl AsRef<Path>) -> Result<(), IoError> {
    let path = path.as_ref();
    let mut w = create(path)?;
    let n = write_megaflow_packets(&mut w)
        .and_then(|n| w.flush().map(|_| n))
        .map_err(|source| IoError::Write {
            path: path.to_owned(),
            source,
        })?;
    info!("wrote {} megaflow packets to {}", n, path.display());
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, IoError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| IoError::Write {
            path: path.to_owned(),
            source,
        })
}

pub fn save_rules<F: RuleFormat>(
    path: impl AsRef<Path>,
    rules: &[Rule],
    format: &F,
    with_priority: bool,
) -> Result<(), IoError> {
    let path = path.as_ref();
    let mut w = create(path)?;
    format
        .write_rules(&mut w, rules, with_priority)
        .and_then(|_| w.flush())
        .map_err(|source| IoError::Write {
            path: path.to_owned(),
            source,
        })?;
    info!("wrote {} rules to {}", rules.len(), path.display());
    Ok(())
}

/// One decimal priority per line.
pub fn write_answers<W: Write>(w: &mut W, answers: &[u32]) -> io::Result<()> {
    for a in answers {
        writeln!(w, "{}", a)?;
    }
    Ok(())
}

pub fn save_answers(path: impl AsRef<Path>, answers: &[u32]) -> Result<(), IoError> {
    let path = path.as_ref();
    let mut w = create(path)?;
    write_answers(&mut w, answers)
        .and_then(|_| w.flush())
        .map_err(|source| IoError::Write {
            path: path.to_owned(),
            source,
        })?;
    info!("wrote {} answers to {}", answers.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_rules, ReadOptions};

    fn render<F: RuleFormat>(format: F, rules: &[Rule], with_priority: bool) -> String {
        let mut buf = vec![];
        format.write_rules(&mut buf, rules, with_priority).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample() -> Rule {
        let mut r = Rule::wildcard(5);
        r.set_prefix(Dimension::SrcIp, 0x0a00_0000, 8);
        r.set_prefix(Dimension::DstIp, 0xc0a8_0100, 24);
        r.set_range(Dimension::SrcPort, 1024, 65535);
        r.set_prefix(Dimension::DstPort, 80, 16);
        r.set_prefix(Dimension::Proto, 6, 8);
        r
    }

    #[test]
    fn test_plain_format() {
        let mut wild = sample();
        wild.set_prefix(Dimension::Proto, 0, 0);
        assert_eq!(
            render(PlainFormat, &[sample(), wild], true),
            "@10.0.0.0/8\t192.168.1.0/24\t1024 : 65535\t80 : 80\t0x06/0xFF\t0x0000/0x0000\t5\t\n\
             @10.0.0.0/8\t192.168.1.0/24\t1024 : 65535\t80 : 80\t0x00/0x00\t0x0000/0x0000\t5\t\n"
        );
    }

    #[test]
    fn test_plain_format_reads_back() {
        let text = render(PlainFormat, &[sample()], false);
        let set = parse_rules(&text, &ReadOptions::default()).unwrap();
        let mut expected = sample();
        expected.priority = 1;
        expected.prefix_len[Dimension::DstPort.index()] = 0;
        assert_eq!(set.rules, vec![expected]);
    }

    #[test]
    fn test_prefix_and_megaflow_format() {
        assert_eq!(
            render(PrefixFormat, &[sample()], false),
            "@10.0.0.0/8\t192.168.1.0/24\t0x0400/0\t0x0050/16\t0x06/8\t\n"
        );
        assert_eq!(
            render(MegaFlowFormat, &[sample()], true),
            "@10.0.0.0/8\t192.168.1.0/24\t0x0400/0\t0x0050/16\t5\t\n"
        );
    }

    #[test]
    fn test_megaflow_packets() {
        let mut buf = vec![];
        assert_eq!(write_megaflow_packets(&mut buf).unwrap(), 32 * 32 * 16 * 16);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 32 * 32 * 16 * 16);
        assert_eq!(lines[0], "0xffffffff 0xffffffff 0xffff 0xffff");
        assert_eq!(lines[1], "0xffffffff 0xffffffff 0xffff 0x7fff");
        assert_eq!(lines[15], "0xffffffff 0xffffffff 0xffff 0x0001");
        assert_eq!(lines[16], "0xffffffff 0xffffffff 0x7fff 0xffff");
        assert_eq!(lines[lines.len() - 1], "0x00000001 0x00000001 0x0001 0x0001");
    }

    #[test]
    fn test_write_answers() {
        let mut buf = vec![];
        write_answers(&mut buf, &[3, 0, 12]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "3\n0\n12\n");
    }
}
