// End-to-end field resolution against an in-memory engine
//
// The engine here stands in for any database: it maps one IPv4 address to a
// fixed record and reports every other address as missing.

use ipdb_field::{
    extract_range, field_at, get_block, get_field, ClientAddress, DatabaseMetadata, FieldError,
    IpFamily, LookupEngine, NodeId, RawRecord,
};
use std::cell::Cell;
use std::net::{Ipv4Addr, Ipv6Addr};

const RECORD: &[u8] =
    b"US\tCA\tLA\tfoo.com\tbar.com\tUSA\tCalifornia\tLos Angeles\tfoo.cn\tbar.cn";
const CLIENT: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 7);

#[derive(Debug, thiserror::Error)]
enum MockError {
    #[error("address not in database")]
    NotFound,
}

struct MockEngine {
    metadata: DatabaseMetadata,
    ipv6: bool,
    lookups: Cell<usize>,
}

impl MockEngine {
    fn new(ipv6: bool) -> Self {
        Self {
            metadata: DatabaseMetadata::new(5, [("EN", 0), ("CN", 5)]),
            ipv6,
            lookups: Cell::new(0),
        }
    }
}

impl LookupEngine for MockEngine {
    type Error = MockError;

    fn is_family_supported(&self, family: IpFamily) -> bool {
        match family {
            IpFamily::V4 => true,
            IpFamily::V6 => self.ipv6,
        }
    }

    fn lookup(&self, bits: &[u8], bit_len: u32) -> Result<NodeId, MockError> {
        self.lookups.set(self.lookups.get() + 1);
        if bit_len == 32 && bits == CLIENT.octets() {
            Ok(NodeId(42))
        } else {
            Err(MockError::NotFound)
        }
    }

    fn resolve_node(&self, node: NodeId) -> Result<RawRecord<'_>, MockError> {
        match node {
            NodeId(42) => Ok(RawRecord::new(RECORD)),
            _ => Err(MockError::NotFound),
        }
    }

    fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }
}

#[test]
fn test_english_city() {
    let engine = MockEngine::new(false);
    let field = get_field(&engine, &CLIENT.into(), "EN", 2).unwrap();
    assert_eq!(field.as_str(), Some("LA"));
    assert_eq!(engine.lookups.get(), 1);
}

#[test]
fn test_second_language_block() {
    let engine = MockEngine::new(false);
    let addr = ClientAddress::from(CLIENT);

    assert_eq!(
        get_field(&engine, &addr, "CN", 2).unwrap().as_str(),
        Some("Los Angeles")
    );
    assert_eq!(
        get_block(&engine, &addr, "CN").unwrap().as_str(),
        Some("USA\tCalifornia\tLos Angeles\tfoo.cn\tbar.cn")
    );
}

#[test]
fn test_unknown_language() {
    let engine = MockEngine::new(false);
    let err = get_field(&engine, &CLIENT.into(), "FR", 0).unwrap_err();
    assert!(matches!(err, FieldError::UnsupportedLanguage(ref l) if l == "FR"));
    assert_eq!(engine.lookups.get(), 0);
}

#[test]
fn test_unsupported_ipv6_never_looks_up() {
    let engine = MockEngine::new(false);
    let addr = ClientAddress::from(Ipv6Addr::LOCALHOST);

    let err = get_field(&engine, &addr, "EN", 0).unwrap_err();
    assert!(matches!(err, FieldError::UnsupportedFamily(IpFamily::V6)));
    assert_eq!(engine.lookups.get(), 0);
}

#[test]
fn test_supported_ipv6_reaches_engine() {
    let engine = MockEngine::new(true);
    let addr = ClientAddress::from(Ipv6Addr::LOCALHOST);

    let err = get_field(&engine, &addr, "EN", 0).unwrap_err();
    assert!(matches!(
        err.engine_error::<MockError>(),
        Some(MockError::NotFound)
    ));
    assert_eq!(engine.lookups.get(), 1);
}

#[test]
fn test_non_ip_socket() {
    let engine = MockEngine::new(true);
    let addr = ClientAddress::Other { family: 1 };

    let err = get_field(&engine, &addr, "EN", 0).unwrap_err();
    assert!(matches!(err, FieldError::InvalidAddressFormat));
    assert_eq!(engine.lookups.get(), 0);
}

#[test]
fn test_field_index_tolerance() {
    let engine = MockEngine::new(false);
    let addr = ClientAddress::from(CLIENT);

    // Five fields; index 5 is tolerated and yields the last one
    assert_eq!(get_field(&engine, &addr, "EN", 4).unwrap().as_str(), Some("bar.com"));
    assert_eq!(get_field(&engine, &addr, "EN", 5).unwrap().as_str(), Some("bar.com"));
    assert!(matches!(
        get_field(&engine, &addr, "EN", 6),
        Err(FieldError::FieldIndexOutOfRange { index: 6, .. })
    ));
}

#[test]
fn test_engine_behind_box_and_reference() {
    let boxed: Box<MockEngine> = Box::new(MockEngine::new(false));
    let by_ref = &boxed;
    assert_eq!(
        get_field(by_ref, &CLIENT.into(), "EN", 0).unwrap().as_str(),
        Some("US")
    );
}

#[test]
fn test_boundaries() {
    assert_eq!(field_at(b"a\tb", 2).unwrap(), b"b");
    assert!(matches!(
        field_at(b"a\tb", 4),
        Err(FieldError::FieldIndexOutOfRange { .. })
    ));
    assert!(matches!(
        extract_range(b"", 0, 1),
        Err(FieldError::MalformedRecord { .. })
    ));
}

#[test]
fn test_repeat_extraction_is_stable() {
    let block = extract_range(RECORD, 5, 5).unwrap().to_vec();
    let copy = block.clone();
    assert_eq!(field_at(&block, 1).unwrap(), field_at(&copy, 1).unwrap());
    assert_eq!(field_at(&block, 1).unwrap(), b"California");
    assert_eq!(block, copy);
}
