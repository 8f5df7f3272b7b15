//! # Dimension family module
//!
//! ## What is a dimension?
//! A classification rule constrains five header fields of a packet, the
//! classic 5-tuple (sip, dip, sport, dport, proto). Each of them is a
//! dimension with a fixed bit width.
//!
//! ## What is it used for?
//! Rules and traces store their fields in dimension order, and the lookup
//! engines are configured with dimension names (e.g. `"sip,dip"`), which are
//! resolved through the generated [DIMENSION_MAP](constant::DIMENSION_MAP).
//!
//! ## Example
//! ```no_run
//! use pclass_core::rule::family::Dimension;
//!
//! let d: Dimension = "dport".parse().unwrap();
//! assert_eq!(d.index(), 3);
//! assert_eq!(d.width(), 16);
//! ```
use std::{fmt::Display, str::FromStr};

use crate::error::ConfigError;

/// Describes a dimension of the 5-tuple.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DimensionDecl {
    pub name: &'static str,
    pub index: usize,
    pub width: u32,
}

pub mod constant {
    include!(concat!(env!("OUT_DIR"), "/codegen.rs"));
}

pub fn get_dimension_declaration(name: &str) -> Option<DimensionDecl> {
    constant::DIMENSION_MAP
        .get_entry(name)
        .map(|(name, (index, width))| DimensionDecl {
            name: *name,
            index: *index,
            width: *width,
        })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    SrcIp = 0,
    DstIp = 1,
    SrcPort = 2,
    DstPort = 3,
    Proto = 4,
}

impl Dimension {
    pub const ALL: [Dimension; constant::DIM_NUM] = [
        Dimension::SrcIp,
        Dimension::DstIp,
        Dimension::SrcPort,
        Dimension::DstPort,
        Dimension::Proto,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn decl(self) -> DimensionDecl {
        let (name, (index, width)) = constant::DIMENSION_MAP
            .index(self.index())
            .expect("every dimension is declared by the build script");
        DimensionDecl {
            name: *name,
            index: *index,
            width: *width,
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.decl().name
    }

    #[inline]
    pub fn width(self) -> u32 {
        self.decl().width
    }

    /// All-ones value of the dimension's width.
    #[inline]
    pub fn max_value(self) -> u32 {
        u32::MAX >> (u32::BITS - self.width())
    }
}

impl From<usize> for Dimension {
    fn from(v: usize) -> Self {
        match v {
            0 => Dimension::SrcIp,
            1 => Dimension::DstIp,
            2 => Dimension::SrcPort,
            3 => Dimension::DstPort,
            4 => Dimension::Proto,
            _ => panic!("Invalid Dimension"),
        }
    }
}

impl FromStr for Dimension {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        get_dimension_declaration(s.trim())
            .map(|decl| Dimension::from(decl.index))
            .ok_or_else(|| ConfigError::UnknownDimension(s.to_owned()))
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
