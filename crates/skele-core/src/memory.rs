//! Process and memory hardening
//!
//! Keeps the skeleton key off the disk:
//!
//! - `disable_core_dumps` sets `RLIMIT_CORE` to zero so a crash cannot write
//!   the key into a core file.
//! - `mlock` / `munlock` pin the pages holding the key so they are never
//!   swapped out. [`SkeletonKey`](crate::SkeletonKey) uses these for its
//!   own storage. Page locks do not nest in the kernel, so every page keeps
//!   a process-wide count and is only unlocked when its last holder lets go.
//!
//! Everything here is best-effort. Containers and unprivileged users often
//! cannot lock memory; that is reported at `warn` level and otherwise
//! ignored.

use std::sync::atomic::{AtomicBool, Ordering};

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Call once, early in `main`. Later calls return `true` without doing
/// anything.
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.swap(true, Ordering::SeqCst) {
        return true;
    }

    #[cfg(unix)]
    {
        unix::set_core_limit_zero()
    }

    #[cfg(not(unix))]
    {
        log::warn!("core dump prevention is not supported on this platform");
        false
    }
}

/// Lock `len` bytes at `ptr` into RAM.
///
/// # Safety
///
/// `ptr` must point to a live allocation of at least `len` bytes, and the
/// region must be passed to [`munlock`] before the allocation is freed.
pub unsafe fn mlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        unix::lock(ptr, len)
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        false
    }
}

/// Unlock a region previously passed to [`mlock`]. Pages still held by
/// another locked region stay locked.
///
/// # Safety
///
/// `ptr` and `len` must match an earlier successful `mlock` call.
pub unsafe fn munlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        unix::unlock(ptr, len)
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        true
    }
}

/// Whether the page holding `ptr` is currently locked by this process.
pub fn is_locked(ptr: *const u8) -> bool {
    #[cfg(unix)]
    {
        unix::holders(ptr) > 0
    }

    #[cfg(not(unix))]
    {
        let _ = ptr;
        false
    }
}

#[cfg(unix)]
mod unix {
    use std::collections::BTreeMap;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Page address → number of locked regions touching it
    static LOCKED_PAGES: Mutex<BTreeMap<usize, usize>> = Mutex::new(BTreeMap::new());

    fn locked_pages() -> MutexGuard<'static, BTreeMap<usize, usize>> {
        LOCKED_PAGES.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn page_size() -> usize {
        // SAFETY: sysconf has no preconditions
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            size as usize
        } else {
            4096
        }
    }

    fn pages(ptr: *const u8, len: usize) -> impl Iterator<Item = usize> {
        let size = page_size();
        let first = ptr as usize / size * size;
        (first..ptr as usize + len).step_by(size)
    }

    pub fn holders(ptr: *const u8) -> usize {
        let page = pages(ptr, 1).next().unwrap_or_default();
        locked_pages().get(&page).copied().unwrap_or(0)
    }

    pub fn set_core_limit_zero() -> bool {
        let limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: plain syscall on a stack value
        let rc = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &limit) };
        if rc != 0 {
            log::warn!(
                "failed to disable core dumps: {}",
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    pub unsafe fn lock(ptr: *const u8, len: usize) -> bool {
        let size = page_size();
        let mut table = locked_pages();

        let mut fresh = Vec::new();
        for page in pages(ptr, len) {
            if table.contains_key(&page) {
                continue;
            }
            if libc::mlock(page as *const libc::c_void, size) != 0 {
                log::warn!(
                    "mlock of {} bytes failed: {}",
                    len,
                    std::io::Error::last_os_error()
                );
                for &page in &fresh {
                    libc::munlock(page as *const libc::c_void, size);
                }
                return false;
            }
            fresh.push(page);
        }

        for page in pages(ptr, len) {
            *table.entry(page).or_insert(0) += 1;
        }
        true
    }

    pub unsafe fn unlock(ptr: *const u8, len: usize) -> bool {
        let size = page_size();
        let mut table = locked_pages();

        let mut ok = true;
        for page in pages(ptr, len) {
            let Some(count) = table.get_mut(&page) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                table.remove(&page);
                ok &= libc::munlock(page as *const libc::c_void, size) == 0;
            }
        }
        ok
    }
}
