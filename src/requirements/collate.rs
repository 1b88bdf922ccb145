//! Locale-aware string comparison for sorting.
//!
//! Collation objects are created per locale (`newlocale`/`strcoll_l`), so no
//! process-wide locale state is touched.

use std::cmp::Ordering;

use log::warn;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("locale '{locale}' is not available")]
pub struct LocaleUnavailable {
    pub locale: String,
}

/// A string comparator bound to a locale.
pub enum Collator {
    /// Byte-wise comparison, identical to the `C` locale.
    Ordinal,
    Locale { name: String, locale: sys::Locale },
}

impl Collator {
    /// Opens a collator for `name`. `C` and `POSIX` map to ordinal order.
    pub fn for_locale(name: &str) -> Result<Self, LocaleUnavailable> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("c") || name.eq_ignore_ascii_case("posix") {
            return Ok(Collator::Ordinal);
        }
        match sys::Locale::open(name) {
            Some(locale) => Ok(Collator::Locale {
                name: name.to_string(),
                locale,
            }),
            None => Err(LocaleUnavailable {
                locale: name.to_string(),
            }),
        }
    }

    /// Like [`Collator::for_locale`], falling back to ordinal comparison with
    /// a warning. Never fails.
    pub fn for_locale_or_ordinal(name: &str) -> Self {
        Self::for_locale(name).unwrap_or_else(|e| {
            warn!("{}; falling back to ordinal sort order", e);
            Collator::Ordinal
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Collator::Ordinal => "C",
            Collator::Locale { name, .. } => name,
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Collator::Ordinal => a.cmp(b),
            Collator::Locale { locale, .. } => locale.compare(a, b).unwrap_or_else(|| a.cmp(b)),
        }
    }
}

impl std::fmt::Debug for Collator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Collator").field(&self.name()).finish()
    }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
pub mod sys {
    use std::cmp::Ordering;
    use std::ffi::{CString, c_char, c_int};

    unsafe extern "C" {
        fn strcoll_l(a: *const c_char, b: *const c_char, locale: libc::locale_t) -> c_int;
    }

    /// An owned `locale_t` restricted to `LC_COLLATE`.
    pub struct Locale(libc::locale_t);

    impl Locale {
        pub fn open(name: &str) -> Option<Self> {
            let name = CString::new(name).ok()?;
            // SAFETY: `name` is a valid NUL-terminated string; a null base
            // asks for a fresh locale object which we own until drop.
            let handle = unsafe {
                libc::newlocale(libc::LC_COLLATE_MASK, name.as_ptr(), std::ptr::null_mut())
            };
            if handle.is_null() {
                None
            } else {
                Some(Self(handle))
            }
        }

        /// Returns `None` when either string contains an interior NUL.
        pub fn compare(&self, a: &str, b: &str) -> Option<Ordering> {
            let a = CString::new(a).ok()?;
            let b = CString::new(b).ok()?;
            // SAFETY: both strings are NUL-terminated and `self.0` is a live
            // locale handle.
            let result = unsafe { strcoll_l(a.as_ptr(), b.as_ptr(), self.0) };
            Some(result.cmp(&0))
        }
    }

    impl Drop for Locale {
        fn drop(&mut self) {
            // SAFETY: the handle came from `newlocale` and is freed once.
            unsafe { libc::freelocale(self.0) }
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub mod sys {
    use std::cmp::Ordering;

    /// Locale collation is unavailable on this platform.
    pub struct Locale;

    impl Locale {
        pub fn open(_name: &str) -> Option<Self> {
            None
        }

        pub fn compare(&self, _a: &str, _b: &str) -> Option<Ordering> {
            None
        }
    }
}
