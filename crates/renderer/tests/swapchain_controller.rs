//! Swapchain recreation while the window is minimized.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vkengine_renderer::{
    RecreateOutcome, SurfaceExtentSource, SwapchainController, SwapchainState, SwapchainTarget,
};
use vkengine_rhi::vk;

type Log = Rc<RefCell<Vec<String>>>;

/// Reports queued extents, repeating the last one.
struct ScriptedWindow {
    extents: RefCell<VecDeque<vk::Extent2D>>,
    log: Log,
}

impl SurfaceExtentSource for ScriptedWindow {
    fn current_extent(&self) -> vk::Extent2D {
        let mut extents = self.extents.borrow_mut();
        let extent = if extents.len() > 1 {
            extents.pop_front()
        } else {
            extents.front().copied()
        }
        .unwrap_or_default();
        self.log
            .borrow_mut()
            .push(format!("poll {}x{}", extent.width, extent.height));
        extent
    }

    fn wait_for_events(&self) -> bool {
        self.log.borrow_mut().push("wait_events".into());
        true
    }
}

struct LoggingTarget {
    log: Log,
}

impl SwapchainTarget for LoggingTarget {
    type Error = String;

    fn wait_idle(&mut self) -> Result<(), String> {
        self.log.borrow_mut().push("wait_idle".into());
        Ok(())
    }

    fn destroy_resources(&mut self) {
        self.log.borrow_mut().push("destroy".into());
    }

    fn create_resources(&mut self, extent: vk::Extent2D) -> Result<(), String> {
        self.log
            .borrow_mut()
            .push(format!("create {}x{}", extent.width, extent.height));
        Ok(())
    }
}

fn extent(width: u32, height: u32) -> vk::Extent2D {
    vk::Extent2D { width, height }
}

#[test]
fn test_create_waits_for_non_zero_extent() {
    let log = Log::default();
    let window = ScriptedWindow {
        extents: RefCell::new(VecDeque::from([
            extent(0, 0),
            extent(0, 0),
            extent(1280, 0),
            extent(1280, 720),
        ])),
        log: log.clone(),
    };
    let mut target = LoggingTarget { log: log.clone() };
    let mut controller = SwapchainController::new();

    controller.invalidate("resize");
    let outcome = controller.recreate(&window, &mut target);

    assert_eq!(outcome, Ok(RecreateOutcome::Recreated(extent(1280, 720))));
    assert_eq!(controller.state(), SwapchainState::Valid);
    assert_eq!(
        *log.borrow(),
        vec![
            "poll 0x0",
            "wait_events",
            "poll 0x0",
            "wait_events",
            "poll 1280x0",
            "wait_events",
            "poll 1280x720",
            "wait_idle",
            "destroy",
            "create 1280x720",
        ]
    );
}

#[test]
fn test_each_recreation_is_counted() {
    let log = Log::default();
    let window = ScriptedWindow {
        extents: RefCell::new(VecDeque::from([extent(640, 480)])),
        log: log.clone(),
    };
    let mut target = LoggingTarget { log };
    let mut controller = SwapchainController::new();

    for _ in 0..3 {
        controller.invalidate("out of date");
        assert!(!controller.is_valid());
        controller.recreate(&window, &mut target).unwrap();
    }
    assert_eq!(controller.recreations(), 3);
}
