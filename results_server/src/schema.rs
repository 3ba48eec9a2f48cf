//! Diesel table definitions for stored test results.
//!
//! Tables: test_run, test_failure. A failure row is keyed by
//! (test_run_id, test_name, test_variant).

diesel::table! {
    test_run (id) {
        id -> Int8,
        branch -> Nullable<Varchar>,
        revision -> Nullable<Varchar>,
        platform -> Varchar,
        dt -> Timestamptz,
        bbnum -> Int4,
        typ -> Varchar,
        info -> Nullable<Varchar>,
    }
}

diesel::table! {
    test_failure (test_run_id, test_name, test_variant) {
        test_run_id -> Int8,
        test_name -> Varchar,
        test_variant -> Varchar,
        info_text -> Nullable<Varchar>,
        failure_text -> Nullable<Text>,
    }
}

diesel::joinable!(test_failure -> test_run (test_run_id));

diesel::allow_tables_to_appear_in_same_query!(test_run, test_failure);
