#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed platform adapter for the Tactica engine.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, so the crate depends on macroquad without its default `audio`
//! feature. Consumers that need sound playback can opt back in by enabling
//! `macroquad/audio` in their own dependency list.
//!
//! The engine renders 8-bit frames itself. This adapter only expands each
//! flipped frame through the uploaded palette into a texture, draws it
//! letterboxed in the window and turns device state into
//! [`tactica_core::RawInput`] snapshots.

mod input;
mod surface;

use std::{
    collections::VecDeque,
    sync::mpsc,
    time::{Duration, Instant},
};

use anyhow::Result;
use glam::Vec2;
use tactica_rendering::{FrameControl, Presentation, RenderingBackend};
use tracing::{error, info};

pub use input::{virtual_key, wheel_notches, TRACKED_KEYS};
pub use surface::{expand_frame, rgba_lookup, Letterbox, MacroquadSurface};

/// Rendering backend implemented on top of macroquad.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Rolling frame-rate statistics.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, frame: Duration, render: Duration) -> Option<FpsMetrics> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.render_accum += render;

        self.frame_times.push_back(frame);
        self.window_duration += frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            let Some(removed) = self.frame_times.pop_front() else {
                break;
            };
            self.window_duration = self.window_duration.saturating_sub(removed);
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let avg_render = self.render_accum / self.frames.max(1);

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.render_accum = Duration::ZERO;
        Some(FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_render,
        })
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut frame: F) -> Result<()>
    where
        F: FnMut(
                Duration,
                tactica_core::RawInput,
                &mut dyn tactica_rendering::PlatformSurface,
            ) -> Result<FrameControl>
            + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            width,
            height,
            scale,
            target_fps,
        } = presentation;

        let window_scale = i32::try_from(scale).unwrap_or(1).max(1);
        let mut config = macroquad::window::Conf {
            window_title: window_title.clone(),
            window_width: width.saturating_mul(window_scale),
            window_height: height.saturating_mul(window_scale),
            high_dpi: false,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        let min_frame_time = Duration::from_secs(1) / target_fps.max(1);
        let (outcome_sender, outcome_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let background = to_macroquad_color(clear_color);
            let mut surface = MacroquadSurface::new(width, height);
            let mut fps_counter = FpsCounter::default();
            let started = Instant::now();
            let mut last_frame = Instant::now();
            let mut frames = 0u64;

            let outcome = loop {
                let now = Instant::now();
                let frame_dt = now.duration_since(last_frame);
                if frame_dt < min_frame_time && frames > 0 {
                    macroquad::window::next_frame().await;
                    continue;
                }
                last_frame = now;

                macroquad::window::clear_background(background);
                surface.fit_window(Vec2::new(
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                ));
                let raw = input::poll(surface.letterbox(), started.elapsed());

                let render_start = Instant::now();
                let control = frame(frame_dt, raw, &mut surface);
                let render_duration = render_start.elapsed();
                frames += 1;

                match control {
                    Ok(FrameControl::Continue) => {}
                    Ok(FrameControl::Exit) => break Ok(()),
                    Err(err) => {
                        error!(error = %err, "frame callback failed");
                        break Err(err);
                    }
                }

                let fps_metrics = fps_counter.record_frame(frame_dt, render_duration);
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        trailing_ten_seconds,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            fps = per_second,
                            trailing = trailing_ten_seconds,
                            frame_ms = avg_render.as_secs_f64() * 1_000.0,
                            "frame timing"
                        );
                    }
                }

                macroquad::window::next_frame().await;
            };

            info!(title = %window_title, frames, "window closed");
            let _ = outcome_sender.send(outcome);
        });

        outcome_receiver.recv().unwrap_or_else(|_| Ok(()))
    }
}

fn to_macroquad_color(color: tactica_rendering::Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_counter_reports_once_per_second() {
        let mut counter = FpsCounter::default();
        let frame = Duration::from_millis(100);
        for _ in 0..9 {
            assert!(counter.record_frame(frame, Duration::from_millis(4)).is_none());
        }
        let metrics = counter
            .record_frame(frame, Duration::from_millis(4))
            .expect("one second elapsed");
        assert!((metrics.per_second - 10.0).abs() < 0.01);
        assert!((metrics.trailing_ten_seconds - 10.0).abs() < 0.01);
        assert_eq!(metrics.avg_render, Duration::from_millis(4));
        assert!(
            counter.record_frame(frame, Duration::ZERO).is_none(),
            "the window restarts after reporting"
        );
    }

    #[test]
    fn fps_counter_trailing_window_drops_old_frames() {
        let mut counter = FpsCounter::default();
        for _ in 0..11 {
            let _ = counter.record_frame(Duration::from_secs(1), Duration::ZERO);
        }
        assert_eq!(counter.frame_times.len(), 10);
        assert_eq!(counter.window_duration, Duration::from_secs(10));
    }

    #[test]
    fn vsync_maps_to_swap_interval() {
        assert_eq!(MacroquadBackend::new().with_vsync(true).swap_interval, Some(1));
        assert_eq!(MacroquadBackend::new().with_vsync(false).swap_interval, Some(0));
    }

    #[test]
    fn presentation_colours_convert_channel_for_channel() {
        let color = to_macroquad_color(tactica_rendering::Color::new(0.25, 0.5, 0.75, 1.0));
        assert_eq!((color.r, color.g, color.b, color.a), (0.25, 0.5, 0.75, 1.0));
    }
}
