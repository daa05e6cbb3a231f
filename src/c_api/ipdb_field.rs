//! Field lookup functions for C callers
//!
//! Handles are opened once per configuration and may be shared by any number
//! of threads. Lookups write the field into a caller-owned buffer and never
//! allocate on the caller's behalf.

use crate::address::ClientAddress;
use crate::config::{GeoConfig, Language};
use crate::error::FieldError;
use crate::geo::GeoDatabase;
use crate::ipdb::IpdbError;
use std::ffi::CStr;
use std::net::IpAddr;
use std::os::raw::c_char;
use std::ptr;

/// Success
pub const IPDB_FIELD_SUCCESS: i32 = 0;
/// NULL or otherwise unusable argument
pub const IPDB_FIELD_ERROR_INVALID_PARAM: i32 = -1;
/// Client address is not IPv4 or IPv6, or does not parse
pub const IPDB_FIELD_ERROR_INVALID_ADDRESS: i32 = -2;
/// Database has no tree for the address family
pub const IPDB_FIELD_ERROR_UNSUPPORTED_FAMILY: i32 = -3;
/// Language is not declared by the database
pub const IPDB_FIELD_ERROR_UNSUPPORTED_LANGUAGE: i32 = -4;
/// Record is shorter than the metadata promises
pub const IPDB_FIELD_ERROR_MALFORMED_RECORD: i32 = -5;
/// Field index past the end of the language block
pub const IPDB_FIELD_ERROR_FIELD_OUT_OF_RANGE: i32 = -6;
/// No record for this address
pub const IPDB_FIELD_ERROR_NOT_FOUND: i32 = -7;
/// Corrupt database or other engine failure
pub const IPDB_FIELD_ERROR_DATABASE: i32 = -8;
/// Output buffer cannot hold the value and its terminator
pub const IPDB_FIELD_ERROR_BUFFER_TOO_SMALL: i32 = -9;

/// Opaque database handle
#[repr(C)]
#[allow(non_camel_case_types)]
pub struct ipdb_field_t {
    _private: [u8; 0],
}

struct IpdbFieldInternal {
    database: GeoDatabase,
}

impl ipdb_field_t {
    fn from_internal(internal: Box<IpdbFieldInternal>) -> *mut Self {
        Box::into_raw(internal) as *mut Self
    }

    /// # Safety
    /// Pointer must have come from from_internal
    unsafe fn into_internal(ptr: *mut Self) -> Box<IpdbFieldInternal> {
        Box::from_raw(ptr as *mut IpdbFieldInternal)
    }

    /// # Safety
    /// Pointer must be valid and from from_internal
    unsafe fn as_internal<'a>(ptr: *const Self) -> &'a IpdbFieldInternal {
        &*(ptr as *const IpdbFieldInternal)
    }
}

/// Map a lookup failure to an error code
fn error_code(err: &FieldError) -> i32 {
    match err {
        FieldError::UnsupportedFamily(_) => IPDB_FIELD_ERROR_UNSUPPORTED_FAMILY,
        FieldError::InvalidAddressFormat => IPDB_FIELD_ERROR_INVALID_ADDRESS,
        FieldError::UnsupportedLanguage(_) => IPDB_FIELD_ERROR_UNSUPPORTED_LANGUAGE,
        FieldError::MalformedRecord { .. } => IPDB_FIELD_ERROR_MALFORMED_RECORD,
        FieldError::FieldIndexOutOfRange { .. } => IPDB_FIELD_ERROR_FIELD_OUT_OF_RANGE,
        FieldError::Engine(_) => match err.engine_error::<IpdbError>() {
            Some(IpdbError::DataNotExists) => IPDB_FIELD_ERROR_NOT_FOUND,
            _ => IPDB_FIELD_ERROR_DATABASE,
        },
    }
}

/// Copy `value` plus a NUL terminator into `buf`
///
/// # Safety
/// `buf` must be writable for `buf_len` bytes; `out_len` may be NULL
unsafe fn copy_out(value: &[u8], buf: *mut c_char, buf_len: usize, out_len: *mut usize) -> i32 {
    if !out_len.is_null() {
        *out_len = value.len();
    }
    if value.len() >= buf_len {
        return IPDB_FIELD_ERROR_BUFFER_TOO_SMALL;
    }
    ptr::copy_nonoverlapping(value.as_ptr(), buf as *mut u8, value.len());
    *buf.add(value.len()) = 0;
    IPDB_FIELD_SUCCESS
}

/// # Safety
/// Same contract as the public lookup functions
unsafe fn lookup_into(
    db: *const ipdb_field_t,
    address: ClientAddress,
    field_index: u32,
    buf: *mut c_char,
    buf_len: usize,
    out_len: *mut usize,
) -> i32 {
    let internal = ipdb_field_t::as_internal(db);
    match internal.database.field_at(address, field_index as usize) {
        Ok(value) => copy_out(value.as_bytes(), buf, buf_len, out_len),
        Err(err) => {
            tracing::debug!(address = ?address, field_index, error = %err, "lookup failed");
            error_code(&err)
        }
    }
}

/// Open a database
///
/// # Parameters
/// * `filename` - Path to the IPDB file (must not be NULL)
/// * `language` - `"EN"` or `"CN"`; NULL selects `"EN"`
///
/// # Returns
/// * Non-null handle on success
/// * NULL if the file cannot be opened or the language is not EN or CN
///
/// # Safety
/// * `filename` and a non-NULL `language` must be valid NUL-terminated C strings
///
/// # Example
/// ```c
/// ipdb_field_t *db = ipdb_field_open("/var/lib/ipdb/city.ipdb", "CN");
/// if (db == NULL) {
///     fprintf(stderr, "Failed to open database\n");
///     return 1;
/// }
/// ```
#[no_mangle]
pub unsafe extern "C" fn ipdb_field_open(
    filename: *const c_char,
    language: *const c_char,
) -> *mut ipdb_field_t {
    if filename.is_null() {
        return ptr::null_mut();
    }
    let path = match CStr::from_ptr(filename).to_str() {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };

    let language = if language.is_null() {
        Language::default()
    } else {
        match CStr::from_ptr(language).to_str().map(str::parse::<Language>) {
            Ok(Ok(language)) => language,
            _ => return ptr::null_mut(),
        }
    };

    match GeoDatabase::open(&GeoConfig::new(path).with_language(language)) {
        Ok(database) => ipdb_field_t::from_internal(Box::new(IpdbFieldInternal { database })),
        Err(err) => {
            tracing::warn!(path, error = %err, "failed to open database");
            ptr::null_mut()
        }
    }
}

/// Close a database
///
/// # Safety
/// * `db` must be NULL or a handle from `ipdb_field_open` not yet closed
#[no_mangle]
pub unsafe extern "C" fn ipdb_field_close(db: *mut ipdb_field_t) {
    if !db.is_null() {
        drop(ipdb_field_t::into_internal(db));
    }
}

/// Look up a field for an address given as text
///
/// On success the field is written to `buf` NUL-terminated. `out_len`, when not
/// NULL, receives the field length without the terminator, also when the
/// buffer is too small.
///
/// # Returns
/// * `IPDB_FIELD_SUCCESS` or a negative `IPDB_FIELD_ERROR_*` code
///
/// # Safety
/// * `db` must be a valid handle
/// * `ip` must be a valid NUL-terminated C string
/// * `buf` must be writable for `buf_len` bytes
#[no_mangle]
pub unsafe extern "C" fn ipdb_field_lookup_string(
    db: *const ipdb_field_t,
    ip: *const c_char,
    field_index: u32,
    buf: *mut c_char,
    buf_len: usize,
    out_len: *mut usize,
) -> i32 {
    if db.is_null() || ip.is_null() || buf.is_null() {
        return IPDB_FIELD_ERROR_INVALID_PARAM;
    }
    let address = match CStr::from_ptr(ip).to_str().map(str::parse::<IpAddr>) {
        Ok(Ok(addr)) => ClientAddress::from(addr),
        _ => return IPDB_FIELD_ERROR_INVALID_ADDRESS,
    };
    lookup_into(db, address, field_index, buf, buf_len, out_len)
}

/// Look up a field for a connected client socket address
///
/// Families other than `AF_INET` and `AF_INET6` fail with
/// `IPDB_FIELD_ERROR_INVALID_ADDRESS`.
///
/// # Safety
/// * `db` must be a valid handle
/// * `sockaddr` must point to a socket address at least as large as its
///   family's structure
/// * `buf` must be writable for `buf_len` bytes
#[cfg(unix)]
#[no_mangle]
pub unsafe extern "C" fn ipdb_field_lookup_sockaddr(
    db: *const ipdb_field_t,
    sockaddr: *const libc::sockaddr,
    field_index: u32,
    buf: *mut c_char,
    buf_len: usize,
    out_len: *mut usize,
) -> i32 {
    if db.is_null() || sockaddr.is_null() || buf.is_null() {
        return IPDB_FIELD_ERROR_INVALID_PARAM;
    }
    lookup_into(db, client_address(sockaddr), field_index, buf, buf_len, out_len)
}

/// # Safety
/// `sockaddr` must be valid for its family's structure size
#[cfg(unix)]
unsafe fn client_address(sockaddr: *const libc::sockaddr) -> ClientAddress {
    match (*sockaddr).sa_family as i32 {
        libc::AF_INET => {
            let sa = sockaddr as *const libc::sockaddr_in;
            ClientAddress::V4(u32::from_be((*sa).sin_addr.s_addr).into())
        }
        libc::AF_INET6 => {
            let sa = sockaddr as *const libc::sockaddr_in6;
            ClientAddress::V6((*sa).sin6_addr.s6_addr.into())
        }
        family => ClientAddress::Other {
            family: family as u16,
        },
    }
}

/// Library version
///
/// The pointer is valid for the program lifetime; do not free it.
#[no_mangle]
pub extern "C" fn ipdb_field_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
