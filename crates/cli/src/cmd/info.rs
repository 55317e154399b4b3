use mlaunch_lib::platform::paths::launch_config_path;
use mlaunch_lib::platform::{current_username, effective_uid, probe_python_version};
use mlaunch_lib::dispatch::docker::buildx_available;
use mlaunch_lib::util::cmd::find_executable;

pub fn cmd_info() {
  println!("Host:");
  match probe_python_version() {
    Ok(version) => println!("Python: {}", version),
    Err(e) => println!("Python: not found ({})", e),
  }
  println!("User: {} (uid {})", current_username(), effective_uid());

  match find_executable("docker") {
    Some(path) => {
      println!("Docker: {}", path.display());
      let buildx = if buildx_available("docker") { "available" } else { "not available" };
      println!("Buildx: {}", buildx);
    }
    None => println!("Docker: not found"),
  }

  match launch_config_path() {
    Some(path) if path.exists() => println!("Launch config: {}", path.display()),
    Some(path) => println!("Launch config: {} (not present)", path.display()),
    None => println!("Launch config: no config directory"),
  }
}
