//! Content digests for downloaded release assets.
//!
//! Files are hashed incrementally in fixed-size chunks so memory stays
//! bounded regardless of asset size. Digests are rendered as lowercase hex,
//! the form used by release manifests.
//!
//! # Example
//!
//! ```
//! use idwr_verify::{Sha256Hasher, VerifiedReader};
//!
//! let data = b"hello world";
//! let expected = Sha256Hasher::digest(data);
//!
//! let mut reader = VerifiedReader::new(&data[..], Sha256Hasher::new());
//! std::io::copy(&mut reader, &mut std::io::sink()).unwrap();
//! reader.finish(&expected).unwrap();
//! ```

pub use self::digest::{CHUNK_SIZE, digest_file, digest_matches};
pub use self::error::{Result, VerifyError};
pub use self::hasher::{Hasher, Sha256Hasher};
pub use self::reader::VerifiedReader;

mod digest;
mod error;
mod hasher;
mod reader;
