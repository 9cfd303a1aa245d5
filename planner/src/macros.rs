//! Macros for building and returning [`crate::error::PlannerError`] values.

/// Creates a [`crate::error::PlannerError`] from a kind, a static description and optional
/// dynamic detail.
///
/// Use `detail =` to move an owned [`String`]; a bare third argument is converted with
/// `to_string()`.
#[macro_export]
macro_rules! planner_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::PlannerError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::PlannerError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        $crate::error::PlannerError::from(($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::PlannerError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::PlannerError::from(($kind, $desc, $detail.to_string()))
            .with_source($source)
    };
}

/// Creates a [`crate::error::PlannerError`] and returns it from the current function.
///
/// Accepts the same arguments as [`planner_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::planner_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::planner_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        return ::core::result::Result::Err($crate::planner_error!($kind, $desc, detail = $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::planner_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::planner_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
