/// Generate accessor functions for fields of [`crate::global_state::Globals`].
///
/// Usage:
/// `global_signals! {
///     pub current_symbol => current_symbol: Symbol,
///     is_loading => is_loading: bool,
/// }`
#[macro_export]
macro_rules! global_signals {
    ( $( $vis:vis $name:ident => $field:ident : $ty:ty ),+ $(,)? ) => {
        $(
            $vis fn $name() -> ::leptos::RwSignal<$ty> {
                $crate::global_state::globals().$field
            }
        )+
    };
}
