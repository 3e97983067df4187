use tracing::debug;

use super::error::CompileError;
use super::segments::Level;

/// Mirror every authored door onto the matching edge of its neighbor.
pub fn propagate_doors(level: &mut Level) -> Result<(), CompileError> {
    for door in level.doors.iter() {
        let owner = &level.segments[door.segment];
        let neighbor = *owner.portals.get(&door.edge).ok_or(CompileError::DoorOnWall {
            door: door.id,
            segment: door.segment,
            edge: door.edge,
            line: door.line,
        })?;

        let candidates: Vec<usize> = level.segments[neighbor]
            .portals
            .iter()
            .filter(|&(_, &target)| target == door.segment)
            .map(|(&edge, _)| edge)
            .collect();
        let &[edge] = candidates.as_slice() else {
            return Err(CompileError::AmbiguousDoorNeighbor {
                door: door.id,
                segment: door.segment,
                neighbor,
                candidates: candidates.len(),
                line: door.line,
            });
        };

        let doors = &mut level.segments[neighbor].doors;
        if let Some(&other) = doors.get(&edge) {
            if other != door.id {
                return Err(CompileError::DoorConflict {
                    door: door.id,
                    other,
                    segment: neighbor,
                    edge,
                    line: door.line,
                });
            }
        }
        doors.insert(edge, door.id);
        debug!(door = door.id, segment = neighbor, edge, "mirrored door");
    }
    Ok(())
}
