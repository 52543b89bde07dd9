// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The contract between the voice engine and the surrounding synthesizer.

use crate::config::EngineConfig;
use crate::filepool::FilePool;
use crate::midi::MidiState;

/// The minimal contract a surrounding synthesizer must satisfy to drive
/// voices.
///
/// Beyond exposing this state, the host carries a few obligations the
/// types cannot enforce:
///
/// - Keep the [`MidiState`] snapshot coherent with the CC events it
///   forwards to `Voice::register_cc`.
/// - Route every render-path call (`render_block`, `register_*`,
///   `FilePool::get_promise`) through a single audio thread.
/// - Call `FilePool::cleanup_promises` periodically so retired sample
///   handles get collected.
/// - Check `Voice::is_free` or `Voice::can_be_stolen` (and reset a stolen
///   voice) before starting a new note on it.
/// - Keep cache mutations (`preload_file`, `set_preload_size`,
///   `set_oversampling_factor`, `clear`) off the audio thread and
///   quiesce rendering around them.
pub trait VoiceHost {
    /// Snapshot of the current controller state.
    fn midi_state(&self) -> &MidiState;

    /// The pool voices get their sample promises from.
    fn file_pool(&self) -> &FilePool;

    /// Engine-wide configuration.
    fn config(&self) -> &EngineConfig;
}
