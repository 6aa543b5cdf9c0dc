/// Checks `decode(encode(x)) == x`, that the encoded length matches [`EncodedSize`] and that
/// decoding consumes exactly the encoded budget.
///
/// [`EncodedSize`]: crate::protocol::traits::EncodedSize
macro_rules! test_roundtrip {
    ($t:ty, $name:ident) => {
        proptest::proptest! {
            #![proptest_config(proptest::test_runner::Config{fork: false, ..Default::default()})]
            #[test]
            fn $name(orig in proptest::prelude::any::<$t>()) {
                use std::io::Cursor;
                use crate::protocol::traits::{EncodedSize, ReadType, WriteType};

                let mut buf = Vec::new();
                WriteType::write(&orig, &mut buf).unwrap();
                proptest::prop_assert_eq!(buf.len(), EncodedSize::encoded_size(&orig));

                let len = buf.len();
                let mut reader = Cursor::new(buf);
                let (restored, remain) = <$t as ReadType<_>>::read(&mut reader, len).unwrap();
                proptest::prop_assert_eq!(remain, 0);
                proptest::prop_assert_eq!(reader.position() as usize, len);
                proptest::prop_assert_eq!(orig, restored);
            }
        }
    };
}

pub(crate) use test_roundtrip;
