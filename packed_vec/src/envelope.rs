//! The binary envelope vectors are serialized into.
//!
//! An envelope carries a format version, the element count, the element width, the byte order the
//! integer payloads were written in, the packed payload and, for nullable vectors, the packed null
//! flags. It is encoded with [bincode] in its standard configuration.
//!
//! Loading validates everything before building any buffers, so a rejected payload never touches
//! the vector it was meant for.

use serde::{Deserialize, Serialize};

use crate::bit_vec::BitVec;
use crate::byte_vec::ByteVec;
use crate::descriptor::VectorType;
use crate::error::{Error, Result};
use crate::vector::{Buffers, Primary};

/// Version written into every envelope. Envelopes of other versions are rejected.
pub const FORMAT_VERSION: u32 = 1;

const CONFIG: bincode::config::Configuration = bincode::config::standard();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    count: i64,
    width: u8,
    little_endian: bool,
    data: Vec<u8>,
    nulls: Option<Vec<u8>>,
}

pub(crate) fn encode(ty: &VectorType, buffers: &Buffers) -> Result<Vec<u8>> {
    let envelope = Envelope {
        version: FORMAT_VERSION,
        count: i64::try_from(buffers.len()).unwrap_or(i64::MAX),
        width: u8::try_from(ty.width()).unwrap_or(u8::MAX),
        little_endian: cfg!(target_endian = "little"),
        data: buffers.primary.raw_data().to_vec(),
        nulls: buffers.nulls.as_ref().map(|nulls| nulls.raw_data().to_vec()),
    };
    Ok(bincode::serde::encode_to_vec(&envelope, CONFIG)?)
}

/// Checks that a buffer of `actual` bytes is exactly what `count` elements need.
fn check_size(count: i64, expected: Option<usize>, actual: usize, what: &str) -> Result<()> {
    match expected {
        Some(expected) if actual == expected => Ok(()),
        Some(expected) if actual < expected => Err(Error::Format(format!(
            "{what} holds {actual} bytes but {count} elements need {expected}"
        ))),
        expected => Err(Error::Overflow {
            count: count as u64,
            expected: expected.unwrap_or(usize::MAX),
            actual,
        }),
    }
}

pub(crate) fn decode(ty: &VectorType, bytes: &[u8]) -> Result<Buffers> {
    let (envelope, read): (Envelope, usize) = bincode::serde::decode_from_slice(bytes, CONFIG)?;
    if read != bytes.len() {
        return Err(Error::Format(format!(
            "{} trailing bytes after envelope",
            bytes.len() - read
        )));
    }

    let Envelope {
        version,
        count,
        width,
        little_endian,
        mut data,
        nulls,
    } = envelope;

    if version != FORMAT_VERSION {
        return Err(Error::Format(format!(
            "unsupported format version {version}, expected {FORMAT_VERSION}"
        )));
    }
    if count < 0 {
        return Err(Error::Range {
            value: count,
            min: 0,
            max: i64::MAX,
        });
    }
    if usize::from(width) != ty.width() {
        return Err(Error::Format(format!(
            "payload has width {width} but {ty} has width {}",
            ty.width()
        )));
    }
    if nulls.is_some() != ty.is_nullable() {
        return Err(Error::Format(format!(
            "payload nullability does not match {ty}"
        )));
    }

    let len = usize::try_from(count).ok();
    let data_bytes = len.and_then(|len| ty.primary_bytes(len));
    check_size(count, data_bytes, data.len(), "data")?;
    if let Some(nulls) = nulls.as_ref() {
        let null_bytes = len.map(|len| len.div_ceil(8));
        check_size(count, null_bytes, nulls.len(), "null flags")?;
    }
    // sizes matched, so the count fits
    let len = len.unwrap_or_default();

    if ty.codec().is_some() && ty.width() > 1 && little_endian != cfg!(target_endian = "little") {
        log::debug!("swapping byte order of {len} {ty} elements");
        data.chunks_exact_mut(ty.width()).for_each(<[u8]>::reverse);
    }

    let primary = if ty.is_bit_packed() {
        BitVec::from_raw(data, len).map(Primary::Bits)
    } else {
        ByteVec::from_raw(ty.width(), data).map(Primary::Bytes)
    }
    .ok_or_else(|| Error::Format("malformed data buffer".into()))?;
    let nulls = nulls
        .map(|nulls| {
            BitVec::from_raw(nulls, len)
                .ok_or_else(|| Error::Format("malformed null flags".into()))
        })
        .transpose()?;

    let mut buffers = Buffers { primary, nulls };
    let null_count = buffers.clear_null_slots();
    log::debug!("loaded {len} {ty} elements, {null_count} of them null");
    Ok(buffers)
}

#[cfg(test)]
mod test {
    use super::{Envelope, CONFIG, FORMAT_VERSION};
    use crate::{Error, PackedVec, Value, VectorType};

    fn envelope(count: i64, width: u8, data: Vec<u8>, nulls: Option<Vec<u8>>) -> Vec<u8> {
        let envelope = Envelope {
            version: FORMAT_VERSION,
            count,
            width,
            little_endian: cfg!(target_endian = "little"),
            data,
            nulls,
        };
        bincode::serde::encode_to_vec(&envelope, CONFIG).unwrap()
    }

    fn sample() -> PackedVec {
        let ty: VectorType = "?int24".parse().unwrap();
        PackedVec::from_values(ty, [Some(-1), None, Some(8388607)]).unwrap()
    }

    #[test]
    fn round_trip_test() {
        let v = sample();
        let bytes = v.serialize().unwrap();

        let mut loaded = PackedVec::new(v.vector_type());
        loaded.push(5).unwrap();
        loaded.deserialize(&bytes).unwrap();
        assert_eq!(v, loaded);
        assert_eq!(1, loaded.null_count());
    }

    #[test]
    fn empty_round_trip_test() {
        let ty = VectorType::boolean();
        let v = PackedVec::new(ty);
        let loaded = PackedVec::from_bytes(ty, &v.serialize().unwrap()).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn negative_count_is_atomic_test() {
        let mut v = sample();
        let before = v.clone();
        let bytes = envelope(-1, 3, vec![], Some(vec![]));

        assert_eq!(
            Err(Error::Range {
                value: -1,
                min: 0,
                max: i64::MAX
            }),
            v.deserialize(&bytes)
        );
        assert_eq!(before, v, "failed load changed the vector");
    }

    #[test]
    fn overflow_test() {
        let ty = VectorType::int(2, false).unwrap();
        let bytes = envelope(2, 2, vec![0; 6], None);
        assert_eq!(
            Err(Error::Overflow {
                count: 2,
                expected: 4,
                actual: 6
            }),
            PackedVec::from_bytes(ty, &bytes)
        );
    }

    #[test]
    fn truncated_data_test() {
        let ty = VectorType::int(2, false).unwrap();
        let bytes = envelope(3, 2, vec![0; 4], None);
        assert!(matches!(PackedVec::from_bytes(ty, &bytes), Err(Error::Format(_))));
    }

    #[test]
    fn null_flags_size_test() {
        let ty = VectorType::boolean().nullable();
        let bytes = envelope(3, 0, vec![0], Some(vec![0, 0]));
        assert!(matches!(
            PackedVec::from_bytes(ty, &bytes),
            Err(Error::Overflow { .. })
        ));
    }

    #[test]
    fn foreign_type_test() {
        let bytes = sample().serialize().unwrap();
        assert!(matches!(
            PackedVec::from_bytes("?int32".parse().unwrap(), &bytes),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            PackedVec::from_bytes("int24".parse().unwrap(), &bytes),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn garbage_test() {
        let ty = VectorType::boolean();
        assert!(matches!(PackedVec::from_bytes(ty, &[]), Err(Error::Format(_))));

        let mut bytes = PackedVec::new(ty).serialize().unwrap();
        bytes.push(0);
        assert!(matches!(PackedVec::from_bytes(ty, &bytes), Err(Error::Format(_))));
    }

    #[test]
    fn version_test() {
        let envelope = Envelope {
            version: FORMAT_VERSION + 1,
            count: 0,
            width: 0,
            little_endian: true,
            data: vec![],
            nulls: None,
        };
        let bytes = bincode::serde::encode_to_vec(&envelope, CONFIG).unwrap();
        assert!(matches!(
            PackedVec::from_bytes(VectorType::boolean(), &bytes),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn foreign_byte_order_test() {
        let ty = VectorType::int(2, true).unwrap();
        let v = PackedVec::from_values(ty, [0x0102, -2]).unwrap();
        let bytes = v.serialize().unwrap();

        let (mut envelope, _): (Envelope, usize) =
            bincode::serde::decode_from_slice(&bytes, CONFIG).unwrap();
        envelope.little_endian = !envelope.little_endian;
        envelope.data.chunks_exact_mut(2).for_each(<[u8]>::reverse);
        let bytes = bincode::serde::encode_to_vec(&envelope, CONFIG).unwrap();

        let loaded = PackedVec::from_bytes(ty, &bytes).unwrap();
        assert_eq!(v, loaded);
    }

    #[test]
    fn byte_strings_keep_order_test() {
        let ty = VectorType::bytes(2).unwrap();
        let bytes = envelope(1, 2, vec![1, 2], None);
        let bytes_flipped = {
            let (mut envelope, _): (Envelope, usize) =
                bincode::serde::decode_from_slice(&bytes, CONFIG).unwrap();
            envelope.little_endian = !envelope.little_endian;
            bincode::serde::encode_to_vec(&envelope, CONFIG).unwrap()
        };
        let loaded = PackedVec::from_bytes(ty, &bytes_flipped).unwrap();
        assert_eq!(Value::Bytes(vec![1, 2]), loaded.get(0).unwrap());
    }

    #[test]
    fn null_slots_normalized_test() {
        let ty: VectorType = "?uint8".parse().unwrap();
        let bytes = envelope(2, 1, vec![7, 9], Some(vec![0b01]));
        let loaded = PackedVec::from_bytes(ty, &bytes).unwrap();

        assert_eq!(vec![Value::Null, Value::Int(9)], loaded.to_json_array());
        assert_eq!(&[0u8, 9], &*loaded.raw_data());
    }
}
