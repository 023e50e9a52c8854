//! Scripted playthroughs over the demo map.

mod playthrough;
