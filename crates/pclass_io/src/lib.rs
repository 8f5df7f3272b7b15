//! This module provides parsing of rule files (.rules) and trace files (.trace), and the writers
//! for rule sets, MegaFlow rule sets and answer files.
//!
//! Malformed records never abort a batch unless [ReadOptions::strict] is set: they are logged and
//! collected in the returned set together with their 1-based line number.
mod error;
mod rules;
mod traces;
mod writer;

pub use crate::{
    error::{IoError, RecordError, RecordErrorKind},
    rules::{
        parse_rule, parse_rules, partition_by_label, read_rules, LabelFilter, ReadOptions, RuleSet,
        Shuffle, MIN_RULE_FIELDS,
    },
    traces::{parse_trace, parse_traces, read_traces, TraceSet, MIN_TRACE_FIELDS},
    writer::{
        save_answers, save_megaflow_packets, save_rules, write_answers, write_megaflow_packets,
        MegaFlowFormat, PlainFormat, PrefixFormat, RuleFormat,
    },
};

/// Basics for io
pub mod basic {
    /// Basic helper functions for parsing
    pub mod parser {
        use nom::branch::alt;
        use nom::bytes::complete::{tag, take_till1, take_while};
        use nom::character::complete::{char, digit1, hex_digit1, oct_digit1};
        use nom::combinator::{all_consuming, map_opt};
        use nom::error::{Error as NomError, ErrorKind, ParseError};
        use nom::multi::many0;
        use nom::sequence::{preceded, terminated, tuple};
        use nom::Err::Error;
        use nom::{Finish, IResult};

        /// Field separators of a rule line.
        #[inline]
        pub fn is_delimiter(chr: char) -> bool {
            matches!(chr, '\t' | ' ' | '/' | ':')
        }

        /// r"[^\t /:]+" separated by any run of r"[\t /:]"
        pub fn parse_tokens<'a, E: ParseError<&'a str>>(
            input: &'a str,
        ) -> IResult<&'a str, Vec<&'a str>, E> {
            terminated(
                many0(preceded(take_while(is_delimiter), take_till1(is_delimiter))),
                take_while(is_delimiter),
            )(input)
        }

        /// Split a line into its fields, empty fields are dropped.
        pub fn tokenize(line: &str) -> Vec<&str> {
            match parse_tokens::<NomError<&str>>(line) {
                Ok((_, tokens)) => tokens,
                Err(_) => vec![],
            }
        }

        /// r"[0-9]+" that fits in a u32
        pub fn parse_u32<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, u32, E> {
            map_opt(digit1, |s: &str| s.parse::<u32>().ok())(input)
        }

        /// C style unsigned integer: r"0[xX][0-9a-fA-F]+", r"0[0-7]+" or r"[0-9]+"
        pub fn parse_c_uint<'a, E: ParseError<&'a str>>(
            input: &'a str,
        ) -> IResult<&'a str, u32, E> {
            alt((
                map_opt(
                    preceded(alt((tag("0x"), tag("0X"))), hex_digit1),
                    |s: &str| u32::from_str_radix(s, 16).ok(),
                ),
                map_opt(preceded(char('0'), oct_digit1), |s: &str| {
                    u32::from_str_radix(s, 8).ok()
                }),
                parse_u32,
            ))(input)
        }

        /// r"[<=255].[<=255].[<=255].[<=255]"
        pub fn parse_ipv4_dotted<'a, E: ParseError<&'a str>>(
            input: &'a str,
        ) -> IResult<&'a str, u32, E> {
            fn parse_u8<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, u8, E> {
                let (rest, num) = digit1(input)?;
                if let Ok(num) = num.parse::<u8>() {
                    Ok((rest, num))
                } else {
                    Err(Error(E::from_error_kind(input, ErrorKind::Digit)))
                }
            }

            let (rest, (o1, _, o2, _, o3, _, o4)) = tuple((
                parse_u8,
                char('.'),
                parse_u8,
                char('.'),
                parse_u8,
                char('.'),
                parse_u8,
            ))(input)?;
            Ok((rest, u32::from_be_bytes([o1, o2, o3, o4])))
        }

        /// r"[<=u32::MAX]"
        pub fn parse_ipv4_num<'a, E: ParseError<&'a str>>(
            input: &'a str,
        ) -> IResult<&'a str, u32, E> {
            parse_u32(input)
        }

        /// Run `parser` over a whole field, `None` if it fails or leaves anything behind.
        pub fn parse_field<'a, O, P>(parser: P, field: &'a str) -> Option<O>
        where
            P: FnMut(&'a str) -> IResult<&'a str, O, NomError<&'a str>>,
        {
            all_consuming(parser)(field)
                .finish()
                .ok()
                .map(|(_, o)| o)
        }

    }

    /// Host/network byte order conversion.
    pub mod net {
        #[inline]
        pub fn htons(v: u16) -> u16 {
            v.to_be()
        }

        #[inline]
        pub fn htonl(v: u32) -> u32 {
            v.to_be()
        }

        #[inline]
        pub fn ntohs(v: u16) -> u16 {
            u16::from_be(v)
        }

        #[inline]
        pub fn ntohl(v: u32) -> u32 {
            u32::from_be(v)
        }

        #[cfg(test)]
        mod tests {
            use super::*;

            #[test]
            fn test_byte_order() {
                assert_eq!(htons(0x1234).to_ne_bytes(), [0x12, 0x34]);
                assert_eq!(htonl(0x0a01_0203).to_ne_bytes(), [10, 1, 2, 3]);
                assert_eq!(ntohs(htons(8080)), 8080);
                assert_eq!(ntohl(u32::from_ne_bytes([192, 168, 0, 1])), 0xc0a8_0001);
            }
        }
    }
}

#[allow(missing_docs)]
pub mod prelude {
    #[doc(hidden)]
    pub use crate::{
        parse_rules, parse_traces, partition_by_label, read_rules, read_traces, save_answers,
        save_megaflow_packets, save_rules, IoError, LabelFilter, MegaFlowFormat, PlainFormat, PrefixFormat,
        ReadOptions, RecordError, RuleFormat, RuleSet, Shuffle, TraceSet,
    };
}
