
mod borrow_tracker_tests;
mod thread_safety_tests;
