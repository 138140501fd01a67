// From itertools: https://github.com/rust-itertools/itertools/blob/master/src/chain.rs
/// [Chain][`chain`] zero or more iterators together into one sequence.
///
/// The comma-separated arguments must implement [`IntoIterator`]; the final
/// argument may be followed by a trailing comma. With no arguments this
/// expands to [`std::iter::empty`], with one to `arg.into_iter()`, and with
/// more to nested [`chain`] calls.
///
/// Diagnostic macros like [crate::issue] and [crate::note] expand to
/// iterators, so [crate::log_diag] collects a variable number of them with
/// this.
///
/// [`chain`]: Iterator::chain
#[macro_export]
macro_rules! chain {
    () => {
        ::std::iter::empty()
    };
    ($first:expr $(, $rest:expr )* $(,)?) => {
        {
            let iter = ::std::iter::IntoIterator::into_iter($first);
            $(
                let iter = ::std::iter::Iterator::chain(
                    iter,
                    ::std::iter::IntoIterator::into_iter($rest)
                );
            )*
            iter
        }
    };
}
