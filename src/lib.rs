//! Gait kinematics library for turning 2D pose keypoints into gait features.
//!
//! This library converts per-frame body keypoints captured from a front and
//! a side camera into lower-limb joint angles and a fixed-length feature
//! vector for a binary gait classifier.
//!
//! The pipeline consists of:
//! 1. Loading per-frame pose records and marking undetected joints as missing
//! 2. Iterative regression imputation of the missing coordinates
//! 3. Hip and knee flexion/extension and abduction/adduction angles per frame
//! 4. Selection of four fixed-length windows as a representative gait cycle
//! 5. Fusion of the front and side cycles and min-max scaled scoring
//!
//! # Examples
//!
//! ## Angles from keypoints
//!
//! ```
//! use gait_kinematics::angles::{knee_flexion_extension, hip_flexion_extension};
//! use gait_kinematics::keypoints::Point;
//!
//! // Straight leg hanging below the hip (image y grows downward)
//! let hip = Point::new(100.0, 100.0);
//! let knee = Point::new(100.0, 200.0);
//! let ankle = Point::new(100.0, 300.0);
//!
//! assert!(knee_flexion_extension(hip, knee, ankle).abs() < 1e-9);
//! assert!(hip_flexion_extension(hip, knee).abs() < 1e-9);
//! ```
//!
//! ## Complete Pipeline Example
//!
//! ```no_run
//! use gait_kinematics::{config::Config, fusion::View, pipeline::Pipeline, scoring::FeatureVector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(Config::default());
//!
//! let front = pipeline.process_clip_dir("json/Su_101_F_1_walk", View::Front)?;
//! let side = pipeline.process_clip_dir("json/Su_101_S_1_walk", View::Side)?;
//!
//! let fused = pipeline.fuse(&front, &side)?;
//! let features = FeatureVector::from_fused(&fused);
//! println!("{} features", features.len());
//! # Ok(())
//! # }
//! ```

/// Joint layout, keypoint table and zero-to-missing conversion
pub mod keypoints;

/// Per-frame pose record loading and frame ordering
pub mod loader;

/// Ordinary least squares used by the imputers
pub mod regression;

/// Iterative imputation of missing coordinates
pub mod imputation;

/// Joint angle families and the angle table
pub mod angles;

/// Representative gait-cycle selection
pub mod cycle;

/// Camera views and front/side fusion
pub mod fusion;

/// Clip-name parsing and grouping for batch runs
pub mod grouping;

/// Feature scaling and the classifier boundary
pub mod scoring;

/// CSV persistence of pipeline artifacts
pub mod export;

/// Pipeline stages and batch driver
pub mod pipeline;

/// Error types and result handling
pub mod error;

/// Constants used throughout the pipeline
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
