pub mod metrics_narrator;
