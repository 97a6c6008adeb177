//! Byte-interval ranges over codec-encoded keys, and the compilation of a
//! predicate conjunction into one range per field.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::codec;
use crate::error::CodecError;
use crate::ops::{Comparator, Op};
use crate::value::ValueType;

/// A half-open-or-closed interval over codec-encoded bytes. An absent
/// endpoint means unbounded on that side. `Ne` predicates cannot be expressed
/// as an interval, so they ride along as an exclusion list: they never narrow
/// the range (and therefore never make an index look more selective), but
/// `contains` honors them.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRange {
    pub start: Option<Vec<u8>>,
    pub end: Option<Vec<u8>>,
    pub include_start: bool,
    pub include_end: bool,
    /// The value type the endpoints were encoded from, when compiled from
    /// predicates; residual evaluation uses it to reject cross-type tests.
    pub value_type: Option<ValueType>,
    ne: Vec<Vec<u8>>,
}

impl KeyRange {
    /// The unbounded range.
    pub fn all() -> Self {
        Self { start: None, end: None, include_start: true, include_end: true, value_type: None, ne: Vec::new() }
    }

    /// The point range `[key, key]`.
    pub fn at(key: Vec<u8>) -> Self {
        Self {
            start: Some(key.clone()),
            end: Some(key),
            include_start: true,
            include_end: true,
            value_type: None,
            ne: Vec::new(),
        }
    }

    pub fn start_bytes(&self) -> Option<&[u8]> {
        self.start.as_deref()
    }

    /// True iff `key` lies inside the interval, respecting endpoint
    /// inclusivity, and is not excluded by an `Ne` predicate.
    pub fn contains(&self, key: &[u8]) -> bool {
        if let Some(start) = &self.start {
            match key.cmp(start.as_slice()) {
                Ordering::Less => return false,
                Ordering::Equal if !self.include_start => return false,
                _ => {}
            }
        }
        if let Some(end) = &self.end {
            match key.cmp(end.as_slice()) {
                Ordering::Greater => return false,
                Ordering::Equal if !self.include_end => return false,
                _ => {}
            }
        }
        !self.ne.iter().any(|excluded| excluded == key)
    }

    /// True once an ascending cursor has passed the end of the interval.
    pub fn end_exceeded(&self, key: &[u8]) -> bool {
        match &self.end {
            Some(end) => key > end.as_slice() || (key == end.as_slice() && !self.include_end),
            None => false,
        }
    }

    /// True iff no key can satisfy the interval.
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => match start.cmp(end) {
                Ordering::Greater => true,
                Ordering::Equal => {
                    !(self.include_start && self.include_end) || self.ne.iter().any(|excluded| excluded == start)
                }
                Ordering::Less => false,
            },
            _ => false,
        }
    }

    /// A byte string approximating the span between the endpoints, used as a
    /// cheap selectivity estimate; `None` when either side is unbounded.
    /// Shorter distance means narrower range; compare with `cmp_distance`.
    pub fn distance(&self) -> Option<Vec<u8>> {
        let (start, end) = (self.start.as_ref()?, self.end.as_ref()?);
        let len = start.len().max(end.len());
        let mut out = vec![0u8; len];
        let mut borrow = 0i16;
        for i in (0..len).rev() {
            let hi = i16::from(*end.get(i).unwrap_or(&0));
            let lo = i16::from(*start.get(i).unwrap_or(&0));
            let mut diff = hi - lo - borrow;
            if diff < 0 {
                diff += 256;
                borrow = 1;
            } else {
                borrow = 0;
            }
            out[i] = diff as u8;
        }
        Some(out)
    }

    /// Orders two selectivity estimates; an unbounded range always loses.
    pub fn cmp_distance(a: &Option<Vec<u8>>, b: &Option<Vec<u8>>) -> Ordering {
        fn magnitude(bytes: &[u8]) -> &[u8] {
            let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
            &bytes[first..]
        }
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => {
                let (a, b) = (magnitude(a), magnitude(b));
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
        }
    }

    fn tighten_start(&mut self, key: Vec<u8>, inclusive: bool) {
        match &self.start {
            Some(current) if *current > key => {}
            Some(current) if *current == key => self.include_start = self.include_start && inclusive,
            _ => {
                self.start = Some(key);
                self.include_start = inclusive;
            }
        }
    }

    fn tighten_end(&mut self, key: Vec<u8>, inclusive: bool) {
        match &self.end {
            Some(current) if *current < key => {}
            Some(current) if *current == key => self.include_end = self.include_end && inclusive,
            _ => {
                self.end = Some(key);
                self.include_end = inclusive;
            }
        }
    }
}

/// Fuses a conjunction of predicates into one `KeyRange` per field by
/// interval intersection. Two predicates of different value types on the same
/// field cannot both hold and are rejected as a `TypeMismatch`.
pub fn compile(ops: &[Op]) -> Result<BTreeMap<String, KeyRange>, CodecError> {
    let mut ranges: BTreeMap<String, KeyRange> = BTreeMap::new();
    for op in ops {
        let range = ranges.entry(op.field.clone()).or_insert_with(|| {
            let mut all = KeyRange::all();
            all.value_type = Some(op.value.value_type());
            all
        });
        if let Some(expected) = range.value_type {
            if expected != op.value.value_type() {
                return Err(CodecError::TypeMismatch { expected, actual: op.value.value_type() });
            }
        }
        let key = codec::encode_operand(&op.value);
        match op.cmp {
            Comparator::Eq => {
                range.tighten_start(key.clone(), true);
                range.tighten_end(key, true);
            }
            Comparator::Gt => range.tighten_start(key, false),
            Comparator::Ge => range.tighten_start(key, true),
            Comparator::Lt => range.tighten_end(key, false),
            Comparator::Le => range.tighten_end(key, true),
            Comparator::Ne => range.ne.push(key),
        }
    }
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn enc(v: i64) -> Vec<u8> {
        codec::encode_single(&Value::I64(v))
    }

    #[test]
    fn equality_compiles_to_point_range() {
        let ranges = compile(&[Op::eq("a", 5i64)]).unwrap();
        let range = &ranges["a"];
        assert_eq!(range.start, Some(enc(5)));
        assert_eq!(range.end, Some(enc(5)));
        assert!(range.include_start && range.include_end);
        assert!(range.contains(&enc(5)));
        assert!(!range.contains(&enc(6)));
    }

    #[test]
    fn inequalities_intersect() {
        let ranges = compile(&[Op::ge("ts", 15i64), Op::lt("ts", 35i64)]).unwrap();
        let range = &ranges["ts"];
        assert!(!range.contains(&enc(10)));
        assert!(range.contains(&enc(15)));
        assert!(range.contains(&enc(34)));
        assert!(!range.contains(&enc(35)));
        assert!(range.end_exceeded(&enc(35)));
        assert!(!range.end_exceeded(&enc(34)));
    }

    #[test]
    fn compile_is_order_insensitive() {
        let ops = [Op::gt("a", 1i64), Op::le("a", 9i64), Op::ne("a", 4i64)];
        let forward = compile(&ops).unwrap();
        let reversed: Vec<Op> = ops.iter().rev().cloned().collect();
        let backward = compile(&reversed).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn contradiction_is_empty() {
        let ranges = compile(&[Op::gt("a", 10i64), Op::lt("a", 5i64)]).unwrap();
        assert!(ranges["a"].is_empty());

        let ranges = compile(&[Op::eq("a", 7i64), Op::ne("a", 7i64)]).unwrap();
        assert!(ranges["a"].is_empty());

        let ranges = compile(&[Op::ge("a", 5i64), Op::lt("a", 5i64)]).unwrap();
        assert!(ranges["a"].is_empty());
    }

    #[test]
    fn ne_does_not_narrow() {
        let ranges = compile(&[Op::ne("a", 3i64)]).unwrap();
        let range = &ranges["a"];
        assert_eq!(range.distance(), None);
        assert!(range.contains(&enc(2)));
        assert!(!range.contains(&enc(3)));
        assert!(range.contains(&enc(4)));
    }

    #[test]
    fn cross_type_conjunction_is_rejected() {
        let err = compile(&[Op::eq("a", 1i64), Op::gt("a", "x")]).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn distance_orders_by_span() {
        let point = compile(&[Op::eq("a", 5i64)]).unwrap().remove("a").unwrap();
        let narrow = compile(&[Op::ge("a", 10i64), Op::lt("a", 20i64)]).unwrap().remove("a").unwrap();
        let wide = compile(&[Op::ge("a", 10i64), Op::lt("a", 2000i64)]).unwrap().remove("a").unwrap();
        let unbounded = compile(&[Op::ge("a", 10i64)]).unwrap().remove("a").unwrap();

        use std::cmp::Ordering::Less;
        assert_eq!(KeyRange::cmp_distance(&point.distance(), &narrow.distance()), Less);
        assert_eq!(KeyRange::cmp_distance(&narrow.distance(), &wide.distance()), Less);
        assert_eq!(KeyRange::cmp_distance(&wide.distance(), &unbounded.distance()), Less);
    }

    #[test]
    fn composite_operands_use_key_form() {
        let tuple = Value::Tuple(vec![Value::Str("us".into()), Value::Str("nyc".into())]);
        let ranges = compile(&[Op::eq("loc", tuple.clone())]).unwrap();
        let Value::Tuple(parts) = tuple else { unreachable!() };
        assert_eq!(ranges["loc"].start, Some(codec::encode_key(&parts)));
    }
}
