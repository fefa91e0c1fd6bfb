fn main() {
    if vmw_tax::cmd::command_main().is_err() {
        vmw_tax::util::sys::exit_with_failure();
    }
}
