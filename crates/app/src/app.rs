use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, info};
use pelikello_core::constants::{PIIP_DISPLAY_DURATION, RENDER_PACING, TICK};
use pelikello_core::input::{EdgeDetector, InputLevels, InputPins};
use pelikello_core::timer::TimerState;
use pelikello_core::{BandLayout, SessionTimer, Settings, SharedState, View, ViewController};
use pelikello_ui::{Display, RenderInput, Renderer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Main loop state: everything the audio callback never touches.
pub struct App<D: Display, P: InputPins> {
    display: D,
    pins: P,
    shared: Arc<SharedState>,
    settings: Settings,
    views: ViewController,
    timer: SessionTimer,
    renderer: Renderer,
    edges: EdgeDetector,
    volumes: Vec<f32>,
    faults: Receiver<anyhow::Error>,
}

impl<D: Display, P: InputPins> App<D, P> {
    pub fn new(
        display: D,
        mut pins: P,
        shared: Arc<SharedState>,
        settings: Settings,
        layout: BandLayout,
        faults: Receiver<anyhow::Error>,
    ) -> Result<Self> {
        let initial = InputLevels::read(&mut pins).context("Failed to read initial input levels")?;
        shared.params.publish(&settings);

        Ok(Self {
            display,
            pins,
            shared,
            settings,
            views: ViewController::new(),
            timer: SessionTimer::default(),
            renderer: Renderer::new(layout),
            edges: EdgeDetector::new(initial),
            volumes: Vec::with_capacity(layout.num_bars),
            faults,
        })
    }

    pub fn view(&self) -> View {
        self.views.view()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    /// Runs one loop iteration and returns how long to sleep before the next.
    pub fn tick(&mut self, now: Instant) -> Result<Duration> {
        match self.faults.try_recv() {
            Ok(fault) => return Err(fault),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
        }

        let levels = InputLevels::read(&mut self.pins).context("Failed to read inputs")?;
        let piip = self.shared.read(&mut self.volumes);

        if self.timer.toggle_on_rising_edge(piip.active, now) {
            let clock = match self.timer.state() {
                TimerState::Running { .. } => "running",
                TimerState::Paused { .. } => "paused",
                TimerState::NotStarted => "not started",
            };
            info!("Piip: clock {} at {}", clock, self.timer.display_text(now));
        }

        let edges = self.edges.update(levels);
        let response = self.views.handle(&edges, &mut self.settings);
        if response.settings_changed {
            self.shared.params.publish(&self.settings);
            let id = self.views.selected_setting();
            info!("{} set to {}", id.label(), self.settings.value(id));
        }

        let timer_text = self.timer.display_text(now);
        let input = RenderInput {
            volumes: &self.volumes,
            settings: &self.settings,
            selected: self.views.selected(),
            piip_active: piip.active,
            timer_text: &timer_text,
        };
        if let Some(frame) = self.renderer.render(self.views.view(), &input)? {
            self.display
                .present(frame)
                .context("Failed to update display")?;
        }

        if self.shared.expire_piip(now, PIIP_DISPLAY_DURATION) {
            debug!("Piip indicator cleared");
        }

        Ok(response.settle + RENDER_PACING + TICK)
    }

    /// Ticks until `running` is cleared or an iteration fails.
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        while running.load(Ordering::Relaxed) {
            let pause = self.tick(Instant::now())?;
            thread::sleep(pause);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use crossbeam_channel::{bounded, Sender};
    use pelikello_core::constants::{BUTTON_SETTLE, NUM_BARS};
    use pelikello_core::input::Pin;
    use pelikello_core::ScalingMode;
    use pelikello_ui::FrameBuffer;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MockPins {
        levels: Rc<Cell<InputLevels>>,
        broken: Rc<Cell<bool>>,
    }

    impl InputPins for MockPins {
        fn read_pin(&mut self, pin: Pin) -> Result<bool> {
            if self.broken.get() {
                return Err(anyhow!("line {} unavailable", pin.bcm()));
            }
            let levels = self.levels.get();
            Ok(match pin {
                Pin::ViewButton => levels.view,
                Pin::ConfirmButton => levels.confirm,
                Pin::EncoderA => levels.encoder_a,
                Pin::EncoderB => levels.encoder_b,
                Pin::EncoderButton => levels.encoder_button,
            })
        }
    }

    #[derive(Clone, Default)]
    struct RecordingDisplay {
        presented: Rc<Cell<usize>>,
        broken: bool,
    }

    impl Display for RecordingDisplay {
        fn present(&mut self, _frame: &FrameBuffer) -> Result<()> {
            if self.broken {
                return Err(anyhow!("bus error"));
            }
            self.presented.set(self.presented.get() + 1);
            Ok(())
        }
    }

    struct Harness {
        app: App<RecordingDisplay, MockPins>,
        pins: MockPins,
        presented: Rc<Cell<usize>>,
        shared: Arc<SharedState>,
        faults: Sender<anyhow::Error>,
    }

    fn harness() -> Harness {
        let settings = Settings::default();
        let shared = Arc::new(SharedState::new(&settings, NUM_BARS));
        let pins = MockPins::default();
        let display = RecordingDisplay::default();
        let presented = display.presented.clone();
        let (faults, rx) = bounded(4);
        let app = App::new(
            display,
            pins.clone(),
            shared.clone(),
            settings,
            BandLayout::default(),
            rx,
        )
        .unwrap();
        Harness {
            app,
            pins,
            presented,
            shared,
            faults,
        }
    }

    fn set_levels(pins: &MockPins, levels: InputLevels) {
        pins.levels.set(levels);
    }

    // ── Views ──

    #[test]
    fn test_spectrum_presents_every_tick() {
        let mut h = harness();
        let t0 = Instant::now();
        for i in 0..3 {
            h.app.tick(t0 + Duration::from_millis(i * 60)).unwrap();
        }
        assert_eq!(h.presented.get(), 3);
    }

    #[test]
    fn test_view_press_switches_and_settles() {
        let mut h = harness();
        let t0 = Instant::now();
        set_levels(
            &h.pins,
            InputLevels {
                view: false,
                ..InputLevels::default()
            },
        );
        let pause = h.app.tick(t0).unwrap();
        assert_eq!(h.app.view(), View::Timer);
        assert_eq!(pause, BUTTON_SETTLE + RENDER_PACING + TICK);
    }

    #[test]
    fn test_idle_timer_view_presents_once() {
        let mut h = harness();
        let t0 = Instant::now();
        set_levels(
            &h.pins,
            InputLevels {
                view: false,
                ..InputLevels::default()
            },
        );
        h.app.tick(t0).unwrap();
        set_levels(&h.pins, InputLevels::default());
        for i in 1..10 {
            h.app.tick(t0 + Duration::from_millis(i * 60)).unwrap();
        }
        // Clock not started: the text never changes
        assert_eq!(h.presented.get(), 1);
    }

    #[test]
    fn test_encoder_button_changes_published_params() {
        let mut h = harness();
        let t0 = Instant::now();
        set_levels(
            &h.pins,
            InputLevels {
                confirm: false,
                ..InputLevels::default()
            },
        );
        h.app.tick(t0).unwrap();
        assert_eq!(h.app.view(), View::Settings);

        set_levels(
            &h.pins,
            InputLevels {
                encoder_button: false,
                ..InputLevels::default()
            },
        );
        h.app.tick(t0 + Duration::from_millis(300)).unwrap();
        assert_eq!(h.app.settings().eq_mode, ScalingMode::Logarithmic);
        assert_eq!(h.shared.params.load().eq_mode, ScalingMode::Logarithmic);
    }

    // ── Piip ──

    #[test]
    fn test_piip_starts_clock_and_expires() {
        let mut h = harness();
        let t0 = Instant::now();
        h.shared.publish(&vec![0.0; NUM_BARS], Some(t0));

        h.app.tick(t0).unwrap();
        assert!(matches!(h.app.timer().state(), TimerState::Running { .. }));
        assert!(h.shared.piip().active);

        // Still held: the clock does not toggle again
        h.app.tick(t0 + Duration::from_millis(100)).unwrap();
        assert!(matches!(h.app.timer().state(), TimerState::Running { .. }));

        h.app.tick(t0 + Duration::from_millis(600)).unwrap();
        assert!(!h.shared.piip().active);
    }

    #[test]
    fn test_second_piip_pauses_clock() {
        let mut h = harness();
        let t0 = Instant::now();
        let silent = vec![0.0; NUM_BARS];
        let ms = |n: u64| t0 + Duration::from_millis(n);

        h.shared.publish(&silent, Some(ms(0)));
        h.app.tick(ms(0)).unwrap();
        h.app.tick(ms(600)).unwrap();
        assert!(!h.shared.piip().active);
        assert!(matches!(h.app.timer().state(), TimerState::Running { .. }));

        // Flag seen low after expiry, so the next detection is a new edge
        h.app.tick(ms(700)).unwrap();
        h.shared.publish(&silent, Some(ms(10_000)));
        h.app.tick(ms(10_000)).unwrap();
        assert!(matches!(h.app.timer().state(), TimerState::Paused { .. }));
        assert_eq!(h.app.timer().elapsed(ms(20_000)), Duration::from_secs(10));
    }

    // ── Failures ──

    #[test]
    fn test_pin_failure_is_fatal() {
        let mut h = harness();
        h.pins.broken.set(true);
        assert!(h.app.tick(Instant::now()).is_err());
    }

    #[test]
    fn test_display_failure_is_fatal() {
        let settings = Settings::default();
        let shared = Arc::new(SharedState::new(&settings, NUM_BARS));
        let display = RecordingDisplay {
            broken: true,
            ..RecordingDisplay::default()
        };
        let (_faults, rx) = bounded(1);
        let mut app = App::new(
            display,
            MockPins::default(),
            shared,
            settings,
            BandLayout::default(),
            rx,
        )
        .unwrap();
        assert!(app.tick(Instant::now()).is_err());
    }

    #[test]
    fn test_stream_fault_is_fatal() {
        let mut h = harness();
        h.faults.try_send(anyhow!("device unplugged")).unwrap();
        let err = h.app.tick(Instant::now()).unwrap_err();
        assert!(err.to_string().contains("unplugged"));
        assert_eq!(h.presented.get(), 0);
    }

    #[test]
    fn test_run_stops_when_flag_cleared() {
        let mut h = harness();
        let running = AtomicBool::new(false);
        h.app.run(&running).unwrap();
        assert_eq!(h.presented.get(), 0);
    }
}
