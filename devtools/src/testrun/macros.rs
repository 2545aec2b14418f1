//! Test declaration macro

/// Declare a self-registering unit test.
///
/// The function must return `bool`; `true` reports as passed. Categories
/// are optional:
///
/// ```no_run
/// kiln_devtools::unit_test! {
///     fn addition_holds() -> bool {
///         1 + 1 == 2
///     }
/// }
///
/// kiln_devtools::unit_test! {
///     ["math", "slow"]
///     fn multiplication_holds() -> bool {
///         6 * 7 == 42
///     }
/// }
/// ```
#[macro_export]
macro_rules! unit_test {
    ([$($category:expr),* $(,)?] fn $name:ident() -> bool $body:block) => {
        fn $name() -> bool $body

        const _: () = {
            #[ctor::ctor]
            fn register() {
                $crate::testrun::register($crate::testrun::UnitTest {
                    module: ::core::module_path!(),
                    categories: &[$($category),*],
                    name: ::core::stringify!($name),
                    run: $name,
                });
            }
        };
    };
    (fn $name:ident() -> bool $body:block) => {
        $crate::unit_test! { [] fn $name() -> bool $body }
    };
}
