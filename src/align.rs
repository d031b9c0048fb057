/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two. Used to express how much address space a
/// request really occupies once the backing system rounds it to its own
/// granule (a page for `mmap`).
///
/// # Examples
///
/// ```rust
/// use mapchurn::align_to;
///
/// assert_eq!(align_to!(1, 4096), 4096);
/// assert_eq!(align_to!(4096, 4096), 4096);
/// assert_eq!(align_to!(200_001, 4096), 200_704);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}
