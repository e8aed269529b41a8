use log::debug;

use super::Simulator;

/// Whatever can be asked to run another frame before the next repaint.
pub trait FrameHost {
    fn request_frame(&self);
}

impl FrameHost for eframe::egui::Context {
    fn request_frame(&self) {
        self.request_repaint();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopHandle(u64);

/// The per-frame simulation task. At most one handle is active; starting a
/// loop cancels the outstanding one first.
#[derive(Debug, Default)]
pub struct FrameLoop {
    active: Option<LoopHandle>,
    issued: u64,
    frames: u64,
}

impl FrameLoop {
    pub fn start(&mut self, host: &impl FrameHost) -> LoopHandle {
        self.cancel();
        self.issued += 1;
        let handle = LoopHandle(self.issued);
        self.active = Some(handle);
        debug!("frame loop {} started", handle.0);
        host.request_frame();
        handle
    }

    pub fn cancel(&mut self) -> Option<LoopHandle> {
        let cancelled = self.active.take();
        if let Some(handle) = cancelled {
            debug!("frame loop {} cancelled after {} frames", handle.0, self.frames);
        }
        self.frames = 0;
        cancelled
    }

    pub fn handle(&self) -> Option<LoopHandle> {
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Frames run by the current handle.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one tick and reschedules. Does nothing once cancelled.
    pub fn drive(&mut self, host: &impl FrameHost, simulator: &mut Simulator) -> bool {
        if self.active.is_none() {
            return false;
        }

        simulator.tick();
        self.frames += 1;
        host.request_frame();
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::board::IdeaCard;
    use crate::sim::SimConfig;

    #[derive(Default)]
    struct CountingHost {
        requests: Cell<usize>,
    }

    impl FrameHost for CountingHost {
        fn request_frame(&self) {
            self.requests.set(self.requests.get() + 1);
        }
    }

    fn simulator() -> Simulator {
        let mut simulator = Simulator::new(SimConfig::default(), Some(3));
        let cards = vec![IdeaCard::new("a", "A"), IdeaCard::new("b", "B")];
        simulator.sync(&cards, &[]);
        simulator
    }

    #[test]
    fn restarting_replaces_the_previous_handle() {
        let host = CountingHost::default();
        let mut frame_loop = FrameLoop::default();

        let first = frame_loop.start(&host);
        let second = frame_loop.start(&host);
        assert_ne!(first, second);
        assert_eq!(frame_loop.handle(), Some(second));
        assert_eq!(host.requests.get(), 2);
    }

    #[test]
    fn driving_ticks_once_per_frame_and_reschedules() {
        let host = CountingHost::default();
        let mut frame_loop = FrameLoop::default();
        let mut simulator = simulator();

        frame_loop.start(&host);
        for _ in 0..5 {
            assert!(frame_loop.drive(&host, &mut simulator));
        }
        assert_eq!(simulator.tick_count(), 5);
        assert_eq!(frame_loop.frames(), 5);
        assert_eq!(host.requests.get(), 6);
    }

    #[test]
    fn cancelled_loop_neither_ticks_nor_reschedules() {
        let host = CountingHost::default();
        let mut frame_loop = FrameLoop::default();
        let mut simulator = simulator();

        let handle = frame_loop.start(&host);
        assert_eq!(frame_loop.cancel(), Some(handle));
        assert!(!frame_loop.drive(&host, &mut simulator));
        assert_eq!(simulator.tick_count(), 0);
        assert_eq!(host.requests.get(), 1);
        assert_eq!(frame_loop.cancel(), None);
    }
}
